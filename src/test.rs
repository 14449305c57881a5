//! Test-only helpers for building a [`GameBoy`] around small, hand
//! authored cartridge images.
//!
//! Real hardware test suites (Blargg's `cpu_instrs`/`instr_timing` ROMs
//! and similar) are not bundled with this crate; the fixtures built here
//! are minimal in-memory images that exercise the same properties --
//! boot handoff, opcode dispatch, MBC banking, interrupt delivery, OAM
//! DMA -- without depending on external assets.

use crate::gb::GameBoy;

/// Builds a minimal 32 KiB ROM-only cartridge image. All header bytes
/// relevant to [`crate::rom::Cartridge::from_data`] default to zero,
/// which decodes as "ROM Only, 32 KB, No RAM" -- exactly what a bare
/// CPU/bus test needs.
pub fn blank_rom() -> Vec<u8> {
    vec![0u8; 32 * 1024]
}

/// Builds a [`GameBoy`] with a blank cartridge already installed and a
/// null serial device attached, the common baseline for tests that only
/// care about CPU/bus behaviour.
pub fn build_test() -> Box<GameBoy> {
    let mut game_boy = Box::new(GameBoy::new());
    game_boy.attach_null_serial();
    game_boy.load_rom_data(&blank_rom(), None).unwrap();
    game_boy
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::{blank_rom, build_test};
    use crate::{
        consts::{BOOT_ADDR, DIV_ADDR, DMA_ADDR, IE_ADDR, IF_ADDR, LCDC_ADDR, LY_ADDR},
        gb::{GameBoy, BIOS_SIZE},
        pad::PadKey,
    };

    #[test]
    fn test_boot_skips_straight_to_cartridge_entry() {
        let mut game_boy = build_test();
        game_boy.boot();
        assert_eq!(game_boy.cpu_i().pc(), 0x0100);
        assert_eq!(game_boy.cpu_i().sp(), 0xfffe);
        assert_eq!(game_boy.read_memory(LCDC_ADDR), 0x91);
        assert!(!game_boy.mmu_i().boot_active());
    }

    #[test]
    fn test_bios_overlay_maps_until_disabled() {
        let mut game_boy = build_test();

        let mut bios = [0u8; BIOS_SIZE];
        bios[0] = 0xab;
        game_boy.load_bios_data(&bios).unwrap();

        assert_eq!(game_boy.read_memory(0x0000), 0xab);

        // a write to 0xFF50 permanently unmaps the BIOS, exposing the
        // cartridge's own (zeroed) first byte underneath
        game_boy.write_memory(BOOT_ADDR, 0x01);
        assert_eq!(game_boy.read_memory(0x0000), 0x00);
    }

    #[test]
    fn test_bios_overlay_unmaps_on_any_written_value() {
        // even a write of 0x00 (not just a nonzero value) permanently
        // disables the overlay -- the BIOS register cares that a write
        // happened at all, not what value it carried
        let mut game_boy = build_test();

        let mut bios = [0u8; BIOS_SIZE];
        bios[0] = 0xab;
        game_boy.load_bios_data(&bios).unwrap();

        game_boy.write_memory(BOOT_ADDR, 0x00);
        assert_eq!(game_boy.read_memory(0x0000), 0x00);
    }

    #[test]
    fn test_load_bios_rejects_wrong_size() {
        let mut game_boy = build_test();
        let result = game_boy.load_bios_data(&[0u8; 100]);
        assert!(result.is_err());
    }

    #[test]
    fn test_opcode_jp_nn_sets_pc_and_takes_16_cycles() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0xc3; // JP nn
            rom[0x0101] = 0x50;
            rom[0x0102] = 0x01;
        }
        game_boy.boot();

        let cycles = game_boy.cpu_clock();
        assert_eq!(cycles, 16);
        assert_eq!(game_boy.cpu_i().pc(), 0x0150);
    }

    #[test]
    fn test_halt_wakes_and_services_pending_interrupt() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0x76; // HALT
        }
        game_boy.boot();
        game_boy.cpu().set_ime(true);
        game_boy.write_memory(IE_ADDR, 0x01); // enable VBLANK only

        let halt_cycles = game_boy.cpu_clock();
        assert_eq!(halt_cycles, 4);
        assert!(game_boy.cpu_i().halted());

        // raising IF.VBLANK while halted with IME enabled wakes the CPU
        // and services the interrupt on the very next clock
        game_boy.write_memory(IF_ADDR, 0x01);
        let service_cycles = game_boy.cpu_clock();

        assert_eq!(service_cycles, 20);
        assert!(!game_boy.cpu_i().halted());
        assert_eq!(game_boy.cpu_i().pc(), 0x0040);
        assert_eq!(game_boy.cpu_i().sp(), 0xfffc);
        // return address (0x0101, right after the HALT) pushed onto the stack
        assert_eq!(game_boy.read_memory(0xfffc), 0x01);
        assert_eq!(game_boy.read_memory(0xfffd), 0x01);
        assert!(!game_boy.ppu().int_vblank());
    }

    #[test]
    fn test_stop_wakes_on_joypad_press_even_with_ie_joypad_disabled() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0x10; // STOP
            rom[0x0101] = 0x00; // the STOP opcode's required second byte
        }
        game_boy.boot();
        game_boy.write_memory(IE_ADDR, 0x00); // no interrupt sources enabled

        let stop_cycles = game_boy.cpu_clock();
        assert_eq!(stop_cycles, 4);
        assert!(game_boy.cpu_i().stopped());

        // a joypad press wakes STOP unconditionally, regardless of IE.JOYPAD
        game_boy.key_down(PadKey::Start);
        let wake_cycles = game_boy.cpu_clock();

        assert_eq!(wake_cycles, 4);
        assert!(!game_boy.cpu_i().stopped());
        // STOP wakes and execution resumes in the same clock() call, running
        // the NOP sitting right after STOP's mandatory second byte
        assert_eq!(game_boy.cpu_i().pc(), 0x0103);
    }

    #[test]
    fn test_mbc1_bank_zero_promotes_to_bank_one() {
        let mut game_boy = build_test();

        // 128 KB / 8 ROM banks, MBC1, no RAM
        let mut data = vec![0u8; 8 * 16 * 1024];
        data[0x0147] = 0x01;
        data[0x0148] = 0x02;
        data[2 * 16384] = 0xaa;
        data[16384] = 0x11;
        game_boy.load_rom_data(&data, None).unwrap();

        game_boy.write_memory(0x2000, 0x02);
        assert_eq!(game_boy.read_memory(0x4000), 0xaa);

        // selecting bank 0 through the 5-bit register is hardwired to
        // promote to bank 1, the MBC1 can never address bank 0 above 0x4000
        game_boy.write_memory(0x2000, 0x00);
        assert_eq!(game_boy.read_memory(0x4000), 0x11);
    }

    #[test]
    fn test_dma_copies_source_into_oam_byte_for_byte() {
        let mut game_boy = build_test();

        for i in 0..160u16 {
            game_boy.write_memory(0xc000 + i, i as u8);
        }
        game_boy.write_memory(DMA_ADDR, 0xc0);
        game_boy.dma_clock(160);

        for i in 0..160u16 {
            assert_eq!(game_boy.read_memory(0xfe00 + i), i as u8);
        }
    }

    #[test]
    fn test_div_register_increments_every_256_cycles() {
        let mut game_boy = build_test();
        assert_eq!(game_boy.read_memory(DIV_ADDR), 0);
        game_boy.timer_clock(256);
        assert_eq!(game_boy.read_memory(DIV_ADDR), 1);
    }

    #[test]
    fn test_div_register_resets_to_zero_on_any_write() {
        let mut game_boy = build_test();
        game_boy.timer_clock(256 * 10);
        assert_ne!(game_boy.read_memory(DIV_ADDR), 0);
        game_boy.write_memory(DIV_ADDR, 0x42);
        assert_eq!(game_boy.read_memory(DIV_ADDR), 0);
    }

    #[test]
    fn test_next_frame_invokes_present_callback_once() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0x18; // JR
            rom[0x0101] = 0xfe; // -2, spins in place forever
        }
        game_boy.boot();

        let frame_count = Rc::new(RefCell::new(0u32));
        let frame_count_cb = frame_count.clone();
        game_boy.set_present_callback(move |_frame_buffer| {
            *frame_count_cb.borrow_mut() += 1;
        });

        let cycles = game_boy.next_frame();
        assert_eq!(*frame_count.borrow(), 1);
        assert!(cycles >= GameBoy::LCD_CYCLES);
    }

    #[test]
    fn test_rom_too_small_is_rejected() {
        let mut game_boy = build_test();
        let result = game_boy.load_rom_data(&[0u8; 100], None);
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_rom_has_expected_size() {
        let rom = blank_rom();
        assert_eq!(rom.len(), 32 * 1024);
    }

    #[test]
    fn test_cp_matches_sub_flags_without_mutating_accumulator() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0xb8; // CP A, B
        }
        game_boy.boot();
        game_boy.cpu().a = 0x10;
        game_boy.cpu().b = 0x10;

        game_boy.cpu_clock();

        // CP computes the same flags as SUB but leaves A untouched
        assert_eq!(game_boy.cpu_i().a, 0x10);
        assert!(game_boy.cpu_i().zero());
        assert!(game_boy.cpu_i().sub());
        assert!(!game_boy.cpu_i().carry());
    }

    #[test]
    fn test_or_is_idempotent_and_clears_sub_half_carry_and_carry() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0xb0; // OR A, B
        }
        game_boy.boot();
        game_boy.cpu().a = 0x42;
        game_boy.cpu().b = 0x42;
        game_boy.cpu().set_sub(true);
        game_boy.cpu().set_half_carry(true);
        game_boy.cpu().set_carry(true);

        game_boy.cpu_clock();

        assert_eq!(game_boy.cpu_i().a, 0x42);
        assert!(!game_boy.cpu_i().zero());
        assert!(!game_boy.cpu_i().sub());
        assert!(!game_boy.cpu_i().half_carry());
        assert!(!game_boy.cpu_i().carry());
    }

    #[test]
    fn test_sub_a_a_always_zeroes_with_no_borrow() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0x97; // SUB A, A
        }
        game_boy.boot();
        game_boy.cpu().a = 0x7f;

        game_boy.cpu_clock();

        assert_eq!(game_boy.cpu_i().a, 0x00);
        assert!(game_boy.cpu_i().zero());
        assert!(!game_boy.cpu_i().carry());
        assert!(!game_boy.cpu_i().half_carry());
    }

    #[test]
    fn test_push_pop_word_round_trips_through_the_stack() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0xc5; // PUSH BC
            rom[0x0101] = 0xd1; // POP DE
        }
        game_boy.boot();
        game_boy.cpu().set_bc(0xbeef);

        game_boy.cpu_clock();
        game_boy.cpu_clock();

        assert_eq!(game_boy.cpu_i().de(), 0xbeef);
        assert_eq!(game_boy.cpu_i().sp(), 0xfffe);
    }

    #[test]
    fn test_ld_mu16_sp_writes_stack_pointer_little_endian() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0x08; // LD [u16], SP
            rom[0x0101] = 0x00;
            rom[0x0102] = 0xc0;
        }
        game_boy.boot();

        game_boy.cpu_clock();

        assert_eq!(game_boy.read_memory(0xc000), 0xfe);
        assert_eq!(game_boy.read_memory(0xc001), 0xff);
    }

    #[test]
    fn test_ppu_frame_duration_cycles_ly_through_vblank() {
        let mut game_boy = build_test();
        {
            let rom = game_boy.rom().rom_data_mut();
            rom[0x0100] = 0x18; // JR
            rom[0x0101] = 0xfe; // -2, spins in place forever
        }
        game_boy.boot();

        let cycles = game_boy.next_frame();
        assert!(cycles >= GameBoy::LCD_CYCLES);
        // next_frame() returns right as VBlank begins, LY sitting at 144
        assert_eq!(game_boy.read_memory(LY_ADDR), 144);
    }
}
