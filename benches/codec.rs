use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use metakit::codec;
use metakit::{DecodeOptions, ImageFactory, MetadataContainer};

#[path = "../tests/fixtures/mod.rs"]
mod fixtures;

fn bench_exif(c: &mut Criterion) {
    metakit::initialize();
    let tiff = fixtures::tiff();
    c.bench_function("exif_decode", |b| {
        b.iter(|| {
            let _exif = codec::exif::decode(black_box(&tiff)).unwrap();
        });
    });

    let (exif, order) = codec::exif::decode(&tiff).unwrap();
    c.bench_function("exif_encode", |b| {
        b.iter(|| {
            let _bytes = codec::exif::encode(black_box(&exif), order).unwrap();
        });
    });
}

fn bench_iptc(c: &mut Criterion) {
    let iim = fixtures::iim();
    c.bench_function("iptc_decode", |b| {
        b.iter(|| {
            let _iptc = codec::iptc::decode(black_box(&iim)).unwrap();
        });
    });

    let iptc = codec::iptc::decode(&iim).unwrap();
    c.bench_function("iptc_encode", |b| {
        b.iter(|| {
            let _bytes = codec::iptc::encode(black_box(&iptc)).unwrap();
        });
    });
}

fn bench_xmp(c: &mut Criterion) {
    metakit::initialize();
    c.bench_function("xmp_decode", |b| {
        b.iter(|| {
            let _xmp = codec::xmp::decode(black_box(fixtures::XMP_PACKET)).unwrap();
        });
    });

    let xmp = codec::xmp::decode(fixtures::XMP_PACKET).unwrap();
    c.bench_function("xmp_encode", |b| {
        b.iter(|| {
            let _packet = codec::xmp::encode(black_box(&xmp)).unwrap();
        });
    });
}

// Full bridge path: open, read, convert every container to native values
fn bench_to_hash(c: &mut Criterion) {
    let file = fixtures::scratch_file(&fixtures::jpeg(), ".jpg");
    let image = ImageFactory::open_with(file.path(), DecodeOptions::default()).unwrap();
    c.bench_function("read_and_to_hash", |b| {
        b.iter(|| {
            image.read_metadata().unwrap();
            let exif = image.exif_data().to_hash();
            let iptc = image.iptc_data().to_hash();
            let xmp = image.xmp_data().to_hash();
            black_box((exif, iptc, xmp));
        });
    });
}

criterion_group!(benches, bench_exif, bench_iptc, bench_xmp, bench_to_hash);
criterion_main!(benches);
