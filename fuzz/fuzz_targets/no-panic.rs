#![no_main]
use libfuzzer_sys::fuzz_target;

use std::fmt::Write;

fuzz_target!(|data: &[u8]| {
    let styles = [
        yaxpeax_8086::DisplayStyle { size_hints: yaxpeax_8086::SizeHints::Memory },
        yaxpeax_8086::DisplayStyle { size_hints: yaxpeax_8086::SizeHints::Always },
    ];

    for style in styles {
        let mut words = yaxpeax_arch::U8Reader::new(data);
        // whole-stream decoding may stop early with an error, but should not panic
        for inst in yaxpeax_8086::Instructions::new(yaxpeax_8086::InstDecoder::default(), &mut words) {
            if let Ok(inst) = inst {
                write!(&mut String::new(), "{}", inst.display_with(style)).expect("formatting does not panic either");
            }
        }
    }
});
