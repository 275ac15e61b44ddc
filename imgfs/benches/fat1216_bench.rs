// SPDX-License-Identifier: MIT

use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use imgfs::fat1216::*;

criterion_group!(benches, bench_table, bench_file_io);
criterion_main!(benches);

const SECTOR: usize = 512;

fn fat16_options() -> FormatOptions {
    FormatOptions {
        total_sectors: 32 * 1024,
        sectors_per_cluster: 4,
        root_entries: 512,
        ..Default::default()
    }
}

fn formatted(opts: &FormatOptions) -> MemStore {
    let store = MemStore::new(vec![0u8; opts.total_sectors as usize * SECTOR]);
    let mut io = store.open(OpenMode::ReadWrite).unwrap();
    Fat1216Formatter::new(io.as_mut(), opts).format(false).unwrap();
    store
}

fn bench_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("fat1216_table");

    for width in [FatWidth::Fat12, FatWidth::Fat16] {
        let entries = 4000u32;
        let mut raw = vec![0u8; width.table_bytes(entries)];
        raw[0] = 0xF8;
        raw[1] = 0xFF;
        raw[2] = 0xFF;
        if width == FatWidth::Fat16 {
            raw[3] = 0xFF;
        }
        let blank = FatTable::from_raw(width, raw, 0xF8, entries).unwrap();

        group.bench_function(format!("{}_allocate_all", width.name()), |b| {
            b.iter_with_setup(
                || blank.clone(),
                |mut table| {
                    let mut alloc = Fat1216Allocator::new(&mut table);
                    while alloc.allocate_unit().is_ok() {}
                },
            );
        });

        group.bench_function(format!("{}_usage_scan", width.name()), |b| {
            b.iter(|| blank.usage());
        });
    }

    group.finish();
}

fn bench_file_io(c: &mut Criterion) {
    let mut group = c.benchmark_group("fat1216_file_io");
    const FILE_SIZE: usize = 4 * 1024 * 1024;

    let opts = fat16_options();
    let width = Fat1216Layout::compute(&opts).unwrap().width;
    let content = vec![0xAAu8; FILE_SIZE];

    group.throughput(Throughput::Bytes(FILE_SIZE as u64));
    group.bench_function("write_4mb_mem", |b| {
        b.iter_with_setup(
            || formatted(&opts),
            |store| {
                let img = Fat1216Image::open(Box::new(store), width);
                let mut root = img.root_directory().unwrap();
                let mut w = root.file_writer("BENCH.BIN").unwrap();
                w.write(&content).unwrap();
                w.close().unwrap();
            },
        );
    });

    let store = formatted(&opts);
    {
        let img = Fat1216Image::open(Box::new(store.clone()), width);
        let mut root = img.root_directory().unwrap();
        let mut w = root.file_writer("BENCH.BIN").unwrap();
        w.write(&content).unwrap();
        w.close().unwrap();
    }

    group.bench_function("read_4mb_mem", |b| {
        let mut buf = vec![0u8; 64 * 1024];
        b.iter(|| {
            let img = Fat1216Image::open(Box::new(store.clone()), width);
            let root = img.root_directory().unwrap();
            let it = find_entry(root.as_ref(), "BENCH.BIN").unwrap().unwrap();
            let mut r = it.file_reader().unwrap();
            while r.read(&mut buf).unwrap() > 0 {}
        });
    });

    group.finish();
}
