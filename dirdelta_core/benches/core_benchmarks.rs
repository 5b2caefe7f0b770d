use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dirdelta_common::{ComparisonMode, TreeSide};
use dirdelta_core::{partition_paths, sha256_file, CompareOptions, ComparisonEngine, TreeIndex};
use std::fs;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Helper to create test directory structure
fn create_test_tree(root: &Path, depth: usize, files_per_dir: usize, file_size: usize) {
    if depth == 0 {
        return;
    }

    for i in 0..files_per_dir {
        let file_path = root.join(format!("file_{}.txt", i));
        let mut file = fs::File::create(&file_path).unwrap();
        let content = vec![b'x'; file_size];
        file.write_all(&content).unwrap();
    }

    if depth > 1 {
        for i in 0..3 {
            let dir_path = root.join(format!("subdir_{}", i));
            fs::create_dir(&dir_path).unwrap();
            create_test_tree(&dir_path, depth - 1, files_per_dir, file_size);
        }
    }
}

fn bench_tree_index_small(c: &mut Criterion) {
    c.bench_function("tree_index_small_tree_10_files", |b| {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path(), 1, 10, 1024);
        let options = CompareOptions::default();

        b.iter(|| {
            let index =
                TreeIndex::build(black_box(temp.path()), TreeSide::Original, &options).unwrap();
            black_box(index.len());
        });
    });
}

fn bench_tree_index_medium(c: &mut Criterion) {
    c.bench_function("tree_index_medium_tree_100_files", |b| {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path(), 2, 10, 1024);
        let options = CompareOptions::default();

        b.iter(|| {
            let index =
                TreeIndex::build(black_box(temp.path()), TreeSide::Original, &options).unwrap();
            black_box(index.len());
        });
    });
}

fn bench_partition_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition_paths");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let original: Vec<PathBuf> = (0..size)
                .map(|i| PathBuf::from(format!("file_{}.txt", i)))
                .collect();
            let new: Vec<PathBuf> = (size / 2..size + size / 2)
                .map(|i| PathBuf::from(format!("file_{}.txt", i)))
                .collect();

            b.iter(|| {
                black_box(partition_paths(black_box(&original), black_box(&new)));
            });
        });
    }

    group.finish();
}

fn bench_sha256_blocksize(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.bin");
    fs::write(&path, vec![0xa5u8; 4 * 1024 * 1024]).unwrap();

    let mut group = c.benchmark_group("sha256_blocksize");

    for blocksize in [4096usize, 65536, 1_048_576].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(blocksize), blocksize, |b, &blocksize| {
            b.iter(|| {
                black_box(sha256_file(black_box(&path), blocksize).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_compare_modes(c: &mut Criterion) {
    let temp_root = TempDir::new().unwrap();
    let original = temp_root.path().join("original");
    let new = temp_root.path().join("new");
    fs::create_dir(&original).unwrap();
    fs::create_dir(&new).unwrap();

    create_test_tree(&original, 2, 5, 1024);
    create_test_tree(&new, 2, 5, 1024);

    let mut group = c.benchmark_group("compare_modes");

    for mode in [ComparisonMode::Quick, ComparisonMode::HashedCommon, ComparisonMode::FullHash] {
        group.bench_function(mode.as_str(), |b| {
            let engine = ComparisonEngine::new(CompareOptions::default().with_mode(mode));
            b.iter(|| {
                let result = engine.compare(black_box(&original), black_box(&new)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

criterion_group!(
    tree_index_benches,
    bench_tree_index_small,
    bench_tree_index_medium
);

criterion_group!(
    set_benches,
    bench_partition_paths
);

criterion_group!(
    hashing_benches,
    bench_sha256_blocksize
);

criterion_group!(
    workflow_benches,
    bench_compare_modes
);

criterion_main!(
    tree_index_benches,
    set_benches,
    hashing_benches,
    workflow_benches
);
