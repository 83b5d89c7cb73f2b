use yaxpeax_arch::{Decoder, U8Reader};
use yaxpeax_8086::{
    classify, displacement_width, effective_address, write_listing, DecodeError, DisplayStyle,
    InstDecoder, Operand, Register, SizeHints, Width,
};

// expected text is what nasm would accept back for the same bytes, checked against the listings
// from the 8086 family user's manual `mov` table.

fn test_display(bytes: &[u8], text: &str) {
    let decoder = InstDecoder::default();
    let inst = decoder.decode(&mut U8Reader::new(bytes)).expect("decode succeeds");
    let rendered = format!("{}", inst);
    assert_eq!(rendered, text);
    assert_eq!(inst.len() as usize, bytes.len(), "{} consumed every byte", text);
}

fn test_display_always(bytes: &[u8], text: &str) {
    let inst = InstDecoder::decode_slice(bytes).expect("decode succeeds");
    let style = DisplayStyle { size_hints: SizeHints::Always };
    assert_eq!(inst.display_with(style).to_string(), text);
}

fn test_invalid(bytes: &[u8], err: DecodeError) {
    assert_eq!(InstDecoder::decode_slice(bytes), Err(err));
}

fn listing(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut reader = U8Reader::new(bytes);
    write_listing(&InstDecoder::default(), &mut reader, &mut out, DisplayStyle::default())
        .expect("listing decodes");
    out
}

#[test]
fn register_to_register() {
    test_display(&[0x89, 0xd8], "mov ax, bx");
    test_display(&[0x89, 0xd9], "mov cx, bx");
    test_display(&[0x88, 0xe5], "mov ch, ah");
    test_display(&[0x89, 0xde], "mov si, bx");
    test_display(&[0x89, 0xfb], "mov bx, di");
    test_display(&[0x88, 0xc8], "mov al, cl");
    test_display(&[0x8b, 0xc3], "mov ax, bx");
    test_display(&[0x8a, 0xd3], "mov dl, bl");
}

#[test]
fn immediate_to_register() {
    test_display(&[0xb8, 0x05, 0x00], "mov ax, 5");
    test_display(&[0xb1, 0x0c], "mov cl, 12");
    test_display(&[0xb5, 0xf4], "mov ch, 244");
    test_display(&[0xb9, 0x0c, 0x00], "mov cx, 12");
    test_display(&[0xb9, 0xf4, 0xff], "mov cx, 65524");
    test_display(&[0xba, 0x6c, 0x0f], "mov dx, 3948");
    test_display(&[0xbf, 0x34, 0x12], "mov di, 4660");
}

#[test]
fn effective_addresses() {
    test_display(&[0x8a, 0x00], "mov al, [bx+si]");
    test_display(&[0x8b, 0x1b], "mov bx, [bp+di]");
    test_display(&[0x8b, 0x56, 0x00], "mov dx, [bp]");
    test_display(&[0x8b, 0x5e, 0x05], "mov bx, [bp+5]");
    test_display(&[0x8a, 0x60, 0x04], "mov ah, [bx+si+4]");
    test_display(&[0x8a, 0x80, 0x87, 0x13], "mov al, [bx+si+4999]");
    test_display(&[0x89, 0x09], "mov [bx+di], cx");
    test_display(&[0x88, 0x0a], "mov [bp+si], cl");
    test_display(&[0x88, 0x6e, 0x00], "mov [bp], ch");
}

#[test]
fn signed_displacements() {
    test_display(&[0x8b, 0x41, 0xdb], "mov ax, [bx+di-37]");
    test_display(&[0x89, 0x8c, 0xd4, 0xfe], "mov [si-300], cx");
    test_display(&[0x8b, 0x57, 0xe0], "mov dx, [bx-32]");
    test_display(&[0x8b, 0x46, 0x80], "mov ax, [bp-128]");
    test_display(&[0x8b, 0x46, 0x7f], "mov ax, [bp+127]");
}

#[test]
fn direct_addresses() {
    test_display(&[0x8b, 0x06, 0x00, 0x10], "mov ax, [4096]");
    test_display(&[0x8b, 0x2e, 0x05, 0x00], "mov bp, [5]");
    test_display(&[0x8b, 0x1e, 0x82, 0x0d], "mov bx, [3458]");
    test_display(&[0x88, 0x36, 0xff, 0xff], "mov [65535], dh");
}

#[test]
fn immediate_to_memory() {
    test_display(&[0xc6, 0x03, 0x07], "mov [bp+di], byte 7");
    test_display(&[0xc7, 0x85, 0x85, 0x03, 0x5b, 0x01], "mov [di+901], word 347");
    test_display(&[0xc7, 0x06, 0x10, 0x00, 0x2c, 0x01], "mov [16], word 300");
    test_display(&[0xc6, 0x46, 0xfe, 0x80], "mov [bp-2], byte 128");
    test_display(&[0xc6, 0xc0, 0x07], "mov al, 7");
    // the `reg` field is an opcode extension here, and does not select an operand
    test_display(&[0xc6, 0xf8, 0x07], "mov al, 7");
}

#[test]
fn accumulator() {
    test_display(&[0xa0, 0x00, 0x20], "mov al, [8192]");
    test_display(&[0xa1, 0xfb, 0x09], "mov ax, [2555]");
    test_display(&[0xa1, 0x10, 0x00], "mov ax, [16]");
    test_display(&[0xa2, 0xfa, 0x09], "mov [2554], al");
    test_display(&[0xa3, 0x0f, 0x00], "mov [15], ax");
}

#[test]
fn segment_registers() {
    test_display(&[0x8e, 0xd0], "mov ss, ax");
    test_display(&[0x8e, 0xdb], "mov ds, bx");
    test_display(&[0x8c, 0xd8], "mov ax, ds");
    test_display(&[0x8c, 0x06, 0x34, 0x12], "mov [4660], es");
    test_display(&[0x8e, 0x4e, 0x02], "mov cs, [bp+2]");
    // the high bit of `sr` is ignored
    test_display(&[0x8e, 0xf0], "mov ss, ax");
}

#[test]
fn size_hints_always() {
    test_display_always(&[0xb8, 0x05, 0x00], "mov ax, word 5");
    test_display_always(&[0xb1, 0x0c], "mov cl, byte 12");
    test_display_always(&[0xc6, 0x03, 0x07], "mov [bp+di], byte 7");
    test_display_always(&[0x89, 0xd8], "mov ax, bx");
}

#[test]
fn operands_and_roles() {
    let inst = InstDecoder::decode_slice(&[0x89, 0xd8]).unwrap();
    assert_eq!(inst.width(), Width::Word);
    assert_eq!(inst.source(), Operand::Register(Register::BX));
    assert_eq!(inst.destination(), Operand::Register(Register::AX));

    let inst = InstDecoder::decode_slice(&[0xb0, 0x80]).unwrap();
    assert_eq!(inst.width(), Width::Byte);
    assert_eq!(inst.source(), Operand::Immediate { value: 0x80, width: Width::Byte });

    let inst = InstDecoder::decode_slice(&[0x8b, 0x46, 0x80]).unwrap();
    assert_eq!(
        inst.source(),
        Operand::Memory { base: Some(Register::BP), index: None, displacement: -128 },
    );

    let inst = InstDecoder::decode_slice(&[0x8b, 0x46, 0x05]).unwrap();
    assert_eq!(
        inst.source(),
        Operand::Memory { base: Some(Register::BP), index: None, displacement: 5 },
    );
}

#[test]
fn memory_modes_match_tables() {
    for mode in 0b00..=0b10u8 {
        for r_m in 0..8u8 {
            let modrm = (mode << 6) | (0b011 << 3) | r_m;
            let bytes = [0x8b, modrm, 0x34, 0x12];
            let inst = InstDecoder::decode_slice(&bytes).expect("memory operand decodes");
            assert_eq!(inst.destination(), Operand::Register(Register::BX));

            if mode == 0b00 && r_m == 0b110 {
                assert_eq!(inst.source(), Operand::DirectAddress(0x1234));
                assert_eq!(inst.len(), 4);
                continue;
            }

            let (base, index) = effective_address(r_m);
            let (displacement, disp_len) = match displacement_width(r_m, mode) {
                None => (0, 0),
                Some(Width::Byte) => (0x34, 1),
                Some(Width::Word) => (0x1234, 2),
            };
            assert_eq!(
                inst.source(),
                Operand::Memory { base: Some(base), index, displacement },
                "mod={:02b} r/m={:03b}", mode, r_m,
            );
            assert_eq!(inst.len() as usize, 2 + disp_len);
        }
    }
}

#[test]
fn every_recognized_opcode_decodes() {
    let mut recognized = 0;
    for opc in 0..=255u8 {
        if classify(opc).is_none() {
            test_invalid(&[opc, 0, 0, 0, 0, 0], DecodeError::UnrecognizedOpcode { offset: 0, byte: opc });
            continue;
        }
        recognized += 1;
        // a zero modrm byte is `[bx+si]` with no displacement, and zeros suffice for any
        // address or immediate that follows
        let bytes = [opc, 0, 0, 0, 0, 0];
        let inst = InstDecoder::decode_slice(&bytes).expect("recognized opcode decodes");
        let text = inst.to_string();
        assert!(text.starts_with("mov "), "{:#04x} rendered as {:?}", opc, text);
        assert_eq!(text.matches(", ").count(), 1, "{:#04x} rendered as {:?}", opc, text);
    }
    // 88-8c, 8e, a0-a3, b0-bf, c6, c7
    assert_eq!(recognized, 28);
}

#[test]
fn truncated_instructions() {
    test_invalid(&[0x8b], DecodeError::UnexpectedEndOfStream { offset: 1 });
    test_invalid(&[0xb8, 0x05], DecodeError::UnexpectedEndOfStream { offset: 2 });
    test_invalid(&[0x8b, 0x06, 0x00], DecodeError::UnexpectedEndOfStream { offset: 3 });
    test_invalid(&[0xc7, 0x85, 0x85, 0x03, 0x5b], DecodeError::UnexpectedEndOfStream { offset: 5 });
    test_invalid(&[0xa0], DecodeError::UnexpectedEndOfStream { offset: 1 });
    test_invalid(&[], DecodeError::UnexpectedEndOfStream { offset: 0 });
}

#[test]
fn unrecognized_opcode() {
    test_invalid(&[0xff], DecodeError::UnrecognizedOpcode { offset: 0, byte: 0xff });

    let mut out = String::new();
    let mut reader = U8Reader::new(&[0x89, 0xd8, 0x90]);
    let res = write_listing(&InstDecoder::default(), &mut reader, &mut out, DisplayStyle::default());
    assert_eq!(
        res.unwrap_err().to_string(),
        "unrecognized opcode 0x90 at offset 0x2",
    );
    assert_eq!(out, "mov ax, bx\n");
}

#[test]
fn listing_is_deterministic() {
    let bytes = [
        0x89, 0xd9, 0x88, 0xe5, 0x89, 0xda, 0x89, 0xde, 0x89, 0xfb, 0x88, 0xc8, 0x88, 0xed, 0x88,
        0xc3, 0x88, 0xf3, 0x89, 0xfc, 0x89, 0xc5,
    ];
    let expected = "\
mov cx, bx
mov ch, ah
mov dx, bx
mov si, bx
mov bx, di
mov al, cl
mov ch, ch
mov bl, al
mov bl, dh
mov sp, di
mov bp, ax
";
    assert_eq!(listing(&bytes), expected);
    assert_eq!(listing(&bytes), listing(&bytes));
}

#[test]
fn mixed_listing() {
    let bytes = [
        0x89, 0xde, 0x88, 0xc6, 0xb1, 0x0c, 0xb5, 0xf4, 0xb9, 0x0c, 0x00, 0xb9, 0xf4, 0xff, 0xba,
        0x6c, 0x0f, 0xba, 0x94, 0xf0, 0x8a, 0x00, 0x8b, 0x1b, 0x8b, 0x56, 0x00, 0x8a, 0x60, 0x04,
        0x8a, 0x80, 0x87, 0x13, 0x89, 0x09, 0x88, 0x0a, 0x88, 0x6e, 0x00,
    ];
    let expected = "\
mov si, bx
mov dh, al
mov cl, 12
mov ch, 244
mov cx, 12
mov cx, 65524
mov dx, 3948
mov dx, 61588
mov al, [bx+si]
mov bx, [bp+di]
mov dx, [bp]
mov ah, [bx+si+4]
mov al, [bx+si+4999]
mov [bx+di], cx
mov [bp+si], cl
mov [bp], ch
";
    assert_eq!(listing(&bytes), expected);
}
