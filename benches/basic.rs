use criterion::{criterion_group, criterion_main, Criterion};
use serial_deck::{CommandList, MemoryLog};
use std::hint::black_box;
use std::time::Duration;

fn sample_list(commands: usize) -> CommandList {
    let mut list = CommandList::new();
    for i in 0..commands {
        let cmd = list.add(format!("cmd{i}"));
        cmd.add_char("op", "W");
        cmd.add_uint8("channel", i as u8);
        cmd.add_uint16("value", (i * 257) as u16);
    }
    list
}

pub fn bench_encode(c: &mut Criterion) {
    let list = sample_list(1);
    let command = list.get(0).unwrap();
    c.bench_function("encode_command", |b| {
        b.iter(|| black_box(command.to_bytes().unwrap()))
    });
}

pub fn bench_documents(c: &mut Criterion) {
    let list = sample_list(64);
    let xml = list.to_xml().unwrap();

    c.bench_function("serialize_64_commands", |b| {
        b.iter(|| black_box(list.to_xml().unwrap()))
    });
    c.bench_function("load_64_commands", |b| {
        let log = MemoryLog::new();
        b.iter(|| {
            let mut loaded = CommandList::new();
            black_box(loaded.load_xml(&xml, &log).unwrap());
            log.drain();
        })
    });
}

criterion_group!{
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_encode, bench_documents
}
criterion_main!(benches);
