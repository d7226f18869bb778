//! Pack a sensor reading on the node side and reassemble it on the cloud side

use std::collections::BTreeMap;

use tracing::level_filters::LevelFilter;
use waggle_packet::{
    HeaderBuilder, PacketConfig, Packer, SequenceCounter, format_node_id, metrics, split_fragment,
    unpack,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::TRACE)
        .with_target(false)
        .try_init();

    println!("Waggle Telemetry Example");
    println!("========================\n");

    let node_id = 0x0000_001E_06AB_CDEF;
    let packer = Packer::new(
        PacketConfig::for_node(node_id),
        std::sync::Arc::new(SequenceCounter::new()),
    )?;

    // A 3 KB reading does not fit one packet
    let reading: Vec<u8> = b"temperature=21.4;humidity=40.2;"
        .iter()
        .copied()
        .cycle()
        .take(3000)
        .collect();

    let packets: Vec<_> = packer
        .pack(
            HeaderBuilder::new().msg_mj_type(b's').msg_mi_type(b'r'),
            reading.clone(),
        )?
        .collect();
    println!(
        "Node {} packed {} bytes into {} packets",
        format_node_id(node_id),
        reading.len(),
        packets.len()
    );

    // Cloud side: the codec hands back raw fragment bodies, the caller stitches them
    let mut chunks = BTreeMap::new();
    let mut expected = 0;
    for packet in packets {
        let (header, body) = unpack(packet)?;
        let (index, chunk) = split_fragment(&body).ok_or("fragment too short")?;
        println!(
            "  seq={} index={} chunk={} bytes",
            header.snd_seq,
            index,
            chunk.len()
        );
        expected = usize::from(header.len_body);
        chunks.insert(index, chunk);
    }

    let message: Vec<u8> = chunks.into_values().flat_map(|c| c.to_vec()).collect();
    assert_eq!(message.len(), expected);
    assert_eq!(message, reading);

    println!("\nReassembled {} bytes, {:?}", message.len(), metrics());

    Ok(())
}
