#![no_main]

use instruction_codec::{decode, WordBits};
use libfuzzer_sys::fuzz_target;
use machine_core::{
    Architecture, ChipSelectDecoder, Memory, Microprocessor, Mode, ReadRequest, SystemBuses,
    MEMORY_CHIPS,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let buses = SystemBuses::new(Architecture::X86);
    let Ok(mut cpu) = Microprocessor::new(10, Mode::Real, &buses) else {
        return;
    };
    let Ok(mut memory) = Memory::new(&cpu, MEMORY_CHIPS, &buses) else {
        return;
    };

    let segment = u16::from_le_bytes([data[0], data[1]]);
    let offset = u16::from_le_bytes([data[2], data[3]]);
    cpu.set_code_segment(segment);
    if cpu.jump(u64::from(offset)).is_err() {
        return;
    }

    for (address, byte) in data[4..].iter().enumerate() {
        let _ = memory.write(address as u64, u64::from(*byte));
    }

    for _ in 0..data.len().min(16) {
        if cpu.fetch().is_err() {
            break;
        }
        let _ = cpu.decode();
    }

    let _ = memory.read(ReadRequest {
        id: u64::from(offset),
        address: u64::from(offset),
    });

    if let Ok(decoder) = ChipSelectDecoder::new(8, 3) {
        let _ = decoder.chip_selection_value(u64::from(data[0]));
    }
    let _ = decode(u64::from(segment), WordBits::Sixteen);
});
