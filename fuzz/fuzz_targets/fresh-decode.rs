//! decoding into a pre-existing instruction should not result in different outcomes compared to
//! decoding into a fresh instruction. if decoding succeeds, both outcomes should be equal.

#![no_main]
use libfuzzer_sys::fuzz_target;

use yaxpeax_arch::Decoder;

fuzz_target!(|data: &[u8]| {
    let decoder = yaxpeax_8086::InstDecoder::default();

    // a reused instruction that last held something with every field set
    let mut reused_inst = yaxpeax_8086::InstDecoder::decode_slice(&[0xc7, 0x85, 0x85, 0x03, 0x5b, 0x01])
        .expect("known-good instruction decodes");

    let mut words = yaxpeax_arch::U8Reader::new(data);
    if let Ok(()) = decoder.decode_into(&mut reused_inst, &mut words) {
        let mut words = yaxpeax_arch::U8Reader::new(data);
        let fresh_inst = decoder.decode(&mut words).expect("decoded before, can decode again");
        assert_eq!(reused_inst, fresh_inst);
    }
});
