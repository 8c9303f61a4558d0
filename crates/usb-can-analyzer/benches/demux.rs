use can_interface::Frame;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use usb_can_analyzer::{encode_frame, StreamDemux};

fn capture(frames: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frames * 16);
    for i in 0..frames {
        let frame = Frame::standard((i % 0x7FF) as u32, &(i as u64).to_le_bytes()).unwrap();
        bytes.extend_from_slice(&encode_frame(&frame).unwrap());
        if i % 7 == 0 {
            bytes.extend_from_slice(&[0x00, 0x13, 0xFF]);
        }
    }
    bytes
}

fn bench_demux(c: &mut Criterion) {
    let bytes = capture(1000);
    let mut group = c.benchmark_group("demux");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("feed_1000_frames", |b| {
        b.iter(|| {
            let mut demux = StreamDemux::new();
            black_box(demux.feed(black_box(&bytes)))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_demux);
criterion_main!(benches);
