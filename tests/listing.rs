use indoc::indoc as asm;
use pretty_assertions::assert_eq;
use yaxpeax_8086::{disassemble_into, DecodeError, InstDecoder, ListingError, ASM_HEADER};

fn disassemble(data: &[u8]) -> String {
    let mut listing = format!("{}\n", ASM_HEADER);
    disassemble_into(&InstDecoder::default(), data, &mut listing).unwrap();
    listing
}

#[test]
fn test_many_register_mov() {
    assert_eq!(
        disassemble(&[
            0b_10001001, 0b_11011001,
            0b_10001000, 0b_11100101,
            0b_10001001, 0b_11011010,
            0b_10001001, 0b_11011110,
            0b_10001001, 0b_11111011,
            0b_10001000, 0b_11001000,
            0b_10001000, 0b_11101101,
            0b_10001001, 0b_11000011,
            0b_10001001, 0b_11110011,
            0b_10001001, 0b_11111100,
            0b_10001001, 0b_11000101,
        ]),
        asm! {"
            bits 16
            mov cx, bx
            mov ch, ah
            mov dx, bx
            mov si, bx
            mov bx, di
            mov al, cl
            mov ch, ch
            mov bx, ax
            mov bx, si
            mov sp, di
            mov bp, ax
        "}
    );
}

#[test]
fn test_more_movs() {
    assert_eq!(
        disassemble(&[
            0x89, 0xde,
            0x88, 0xc6,
            0xb1, 0x0c,
            0xb5, 0xf4,
            0xb9, 0x0c, 0x00,
            0xba, 0x6c, 0x0f,
            0x8a, 0x00,
            0x8b, 0x1b,
            0x8b, 0x56, 0x00,
            0x8a, 0x60, 0x04,
            0x8a, 0x80, 0x87, 0x13,
            0x89, 0x09,
            0x88, 0x0a,
            0x88, 0x6e, 0x00,
        ]),
        asm! {"
            bits 16
            mov si, bx
            mov dh, al
            mov cl, 12
            mov ch, 244
            mov cx, 12
            mov dx, 3948
            mov al, [bx + si]
            mov bx, [bp + di]
            mov dx, [bp]
            mov ah, [bx + si + 4]
            mov al, [bx + si + 4999]
            mov [bx + di], cx
            mov [bp + si], cl
            mov [bp], ch
        "}
    );
}

#[test]
fn test_challenge_movs() {
    assert_eq!(
        disassemble(&[
            0x8b, 0x41, 0xdb,
            0x89, 0x8c, 0xd4, 0xfe,
            0x8b, 0x57, 0xe0,
            0xc6, 0x03, 0x07,
            0xc7, 0x85, 0x85, 0x03, 0x5b, 0x01,
            0x8b, 0x2e, 0x05, 0x00,
            0x8b, 0x1e, 0x82, 0x0d,
            0xa1, 0xfb, 0x09,
            0xa1, 0x10, 0x00,
            0xa3, 0xfa, 0x09,
            0xa3, 0x0f, 0x00,
            0xc6, 0x06, 0x00, 0x00, 0x07,
        ]),
        asm! {"
            bits 16
            mov ax, [bx + di - 37]
            mov [si - 300], cx
            mov dx, [bx - 32]
            mov [bp + di], 7
            mov [di + 901], 347
            mov bp, [5]
            mov bx, [3458]
            mov ax, [2555]
            mov ax, [16]
            mov [2554], ax
            mov [15], ax
            mov [0], 7
        "}
    );
}

#[test]
fn test_empty_input() {
    let mut listing = String::new();
    assert_eq!(disassemble_into(&InstDecoder::default(), &[], &mut listing), Ok(0));
    assert_eq!(listing, "");
}

#[test]
fn test_truncated_keeps_earlier_lines() {
    let mut listing = String::new();
    let result = disassemble_into(&InstDecoder::default(), &[0x89, 0xd9, 0x8b, 0x86, 0x10], &mut listing);
    assert_eq!(
        result,
        Err(ListingError::Decode { offset: 2, error: DecodeError::TruncatedInstruction })
    );
    assert_eq!(listing, "mov cx, bx\n");
}

#[test]
fn test_unrecognized_opcode_stops() {
    let mut listing = String::new();
    let result = disassemble_into(&InstDecoder::default(), &[0x89, 0xd9, 0x8e, 0xd8, 0x89, 0xd9], &mut listing);
    assert_eq!(
        result,
        Err(ListingError::Decode { offset: 2, error: DecodeError::UnrecognizedOpcode(0x8e) })
    );
    assert_eq!(listing, "mov cx, bx\n");
    assert_eq!(
        result.unwrap_err().to_string(),
        "invalid instruction at offset 0x0002: unrecognized opcode (0x8e)"
    );
}

#[test]
fn test_instruction_offsets() {
    let data = [0xb1, 0x0c, 0xc6, 0x06, 0x00, 0x00, 0x07, 0x8b, 0x41, 0xdb];
    let decoded: Vec<_> = InstDecoder::default()
        .instructions(&data)
        .map(|decoded| decoded.map(|(offset, inst)| (offset, inst.to_string())))
        .collect();
    assert_eq!(
        decoded,
        vec![
            Ok((0, "mov cl, 12".to_owned())),
            Ok((2, "mov [0], 7".to_owned())),
            Ok((7, "mov ax, [bx + di - 37]".to_owned())),
        ]
    );
}

#[test]
fn test_iteration_stops_after_error() {
    let mut instructions = InstDecoder::default().instructions(&[0xb8, 0x01]);
    assert_eq!(
        instructions.next().map(|r| r.map(|(offset, _)| offset)),
        Some(Err(ListingError::Decode { offset: 0, error: DecodeError::TruncatedInstruction }))
    );
    assert!(instructions.next().is_none());
    assert!(instructions.next().is_none());
}

#[test]
fn test_raw_byte_displacement_listing() {
    let mut listing = String::new();
    disassemble_into(&InstDecoder::default().raw_byte_displacements(), &[0x8b, 0x41, 0xdb, 0x8b, 0x41, 0x25], &mut listing).unwrap();
    assert_eq!(
        listing,
        asm! {"
            mov ax, [bx + di + 219]
            mov ax, [bx + di + 37]
        "}
    );
}
