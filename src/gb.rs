//! Game Boy emulation entrypoint and associated functions and structures.
//!
//! Most of the meaningful publicly available functions and structures to
//! build a working emulator should be present here: [`GameBoy`] owns every
//! component (CPU, bus, PPU, timer, pad, serial, APU) as plain fields and
//! drives the single-threaded dispatch loop described in the scheduler
//! section of the design.
//!
//! # Examples
//!
//! Creates a simple [`GameBoy`] instance, installs a BIOS and cartridge,
//! and clocks the CPU until the boot sequence completes (PC reaches 0x0100).
//!
//! ```rust
//! use pocketgb::gb::GameBoy;
//! let mut game_boy = GameBoy::new();
//! game_boy.load_bios_data(&[0u8; 256]).unwrap();
//! game_boy.load_rom_data(&[0u8; 32 * 1024], None).unwrap();
//! let cycles = game_boy.step_to(0x0100);
//! println!("Ran {} cycles", cycles);
//! ```

use pocketgb_common::{
    error::Error,
    util::{read_file, replace_ext, SharedThread},
};
use std::{
    fmt::{self, Display, Formatter},
    sync::{Arc, Mutex},
};

use crate::{
    apu::Apu,
    cpu::Cpu,
    dma::Dma,
    info::Info,
    mmu::Mmu,
    pad::{Pad, PadKey},
    ppu::{Ppu, FRAME_BUFFER_SIZE},
    rom::Cartridge,
    serial::{NullDevice, Serial, SerialDevice},
    timer::Timer,
};

/// Exactly the size of the DMG boot ROM; anything else is a load error.
pub const BIOS_SIZE: usize = 256;

/// Aggregation structure allowing the bundling of all the components of
/// a [`GameBoy`] (other than the CPU/bus themselves) into a single value
/// for easy construction.
pub struct Components {
    pub ppu: Ppu,
    pub apu: Apu,
    pub dma: Dma,
    pub pad: Pad,
    pub timer: Timer,
    pub serial: Serial,
}

/// Shared, per-component enable flags and the nominal clock frequency,
/// handed out to every component that needs to adjust its own behaviour
/// (e.g. the APU's sample rate) to the running configuration.
#[derive(Clone, Copy)]
pub struct GameBoyConfig {
    ppu_enabled: bool,
    apu_enabled: bool,
    dma_enabled: bool,
    timer_enabled: bool,
    serial_enabled: bool,
    clock_freq: u32,
}

impl GameBoyConfig {
    pub fn ppu_enabled(&self) -> bool {
        self.ppu_enabled
    }

    pub fn set_ppu_enabled(&mut self, value: bool) {
        self.ppu_enabled = value;
    }

    pub fn apu_enabled(&self) -> bool {
        self.apu_enabled
    }

    pub fn set_apu_enabled(&mut self, value: bool) {
        self.apu_enabled = value;
    }

    pub fn dma_enabled(&self) -> bool {
        self.dma_enabled
    }

    pub fn set_dma_enabled(&mut self, value: bool) {
        self.dma_enabled = value;
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn set_timer_enabled(&mut self, value: bool) {
        self.timer_enabled = value;
    }

    pub fn serial_enabled(&self) -> bool {
        self.serial_enabled
    }

    pub fn set_serial_enabled(&mut self, value: bool) {
        self.serial_enabled = value;
    }

    pub fn clock_freq(&self) -> u32 {
        self.clock_freq
    }

    pub fn set_clock_freq(&mut self, value: u32) {
        self.clock_freq = value;
    }
}

impl Default for GameBoyConfig {
    fn default() -> Self {
        Self {
            ppu_enabled: true,
            apu_enabled: true,
            dma_enabled: true,
            timer_enabled: true,
            serial_enabled: true,
            clock_freq: GameBoy::CPU_FREQ,
        }
    }
}

/// Register snapshot used by diagnostics/debuggers, avoiding the need
/// to expose the CPU's private fields directly.
pub struct Registers {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
}

/// Top level structure that abstracts the usage of the Game Boy system.
///
/// Owns every component as a plain field (the CPU owns the bus, which in
/// turn owns every memory-mapped component) and serves as the sole entry
/// point external callers (a CLI, a test, a benchmark) use to drive the
/// emulator. There is no circular ownership: the bus is not a trait
/// object shared back up to the components, it simply owns them.
pub struct GameBoy {
    ppu_enabled: bool,
    apu_enabled: bool,
    dma_enabled: bool,
    timer_enabled: bool,
    serial_enabled: bool,
    clock_freq: u32,

    /// Owns the registers, the dispatch tables and (transitively, via
    /// the bus) every other component of the system.
    cpu: Cpu,

    /// Shared configuration handed out to every component at
    /// construction time.
    gbc: SharedThread<GameBoyConfig>,

    /// Host callback invoked once per Game Boy frame, at the start of
    /// V-blank, with the current 160x144 shade-index framebuffer. This
    /// is the only contract the core has with the host display/window
    /// layer (see the purpose/scope notes on external collaborators).
    present: Option<Box<dyn FnMut(&[u8; FRAME_BUFFER_SIZE])>>,
}

impl GameBoy {
    /// The logic frequency of the Game Boy CPU in hz.
    pub const CPU_FREQ: u32 = 4_194_304;

    /// The visual frequency (refresh rate) of the Game Boy, close to 60 hz.
    pub const VISUAL_FREQ: f32 = 59.7275;

    /// The cycles taken to run a complete frame loop in the Game Boy's
    /// PPU (in CPU T-cycles): 154 lines of 456 cycles each.
    pub const LCD_CYCLES: u32 = 70224;

    pub fn new() -> Self {
        let gbc = Arc::new(Mutex::new(GameBoyConfig::default()));

        let components = Components {
            ppu: Ppu::new(gbc.clone()),
            apu: Apu::new(),
            dma: Dma::new(),
            pad: Pad::new(),
            timer: Timer::new(),
            serial: Serial::new(),
        };
        let mut mmu = Mmu::new(components, gbc.clone());
        mmu.allocate_default();
        let cpu = Cpu::new(mmu, gbc.clone());

        Self {
            ppu_enabled: true,
            apu_enabled: true,
            dma_enabled: true,
            timer_enabled: true,
            serial_enabled: true,
            clock_freq: Self::CPU_FREQ,
            cpu,
            gbc,
            present: None,
        }
    }

    /// Resets every component to its power-on state, keeping the
    /// currently installed boot ROM/cartridge data alive (the bus
    /// re-allocates fresh, zeroed WRAM/HRAM buffers, but
    /// [`Mmu::reset`] drops the boot ROM bytes, so callers that need
    /// BIOS behaviour across a reset must reload it).
    pub fn reset(&mut self) {
        self.ppu().reset();
        self.apu().reset();
        self.dma().reset();
        self.timer().reset();
        self.serial().reset();
        self.pad().reset();
        self.mmu().reset();
        self.mmu().allocate_default();
        self.cpu.reset();
    }

    /// Advances the clock of the system by one tick: one CPU
    /// instruction (or one HALT/STOP tick), followed by forwarding
    /// the consumed T-cycles to the PPU, APU, DMA, timer and serial
    /// components, in that order (see the scheduling model). Invokes
    /// the presentation callback if a frame just completed.
    pub fn clock(&mut self) -> u16 {
        let cycles = self.cpu_clock() as u16;
        self.clock_devices(cycles);
        if self.ppu().take_frame_ready() {
            self.present_frame();
        }
        cycles
    }

    /// Equivalent to [`GameBoy::clock`] but allows the execution of
    /// multiple clock operations in a single call.
    pub fn clocks(&mut self, count: usize) -> u64 {
        let mut cycles = 0_u64;
        for _ in 0..count {
            cycles += self.clock() as u64;
        }
        cycles
    }

    /// Clocks the emulator until at least `limit` T-cycles have been
    /// consumed, returning the exact amount clocked (may overshoot by
    /// up to one instruction's worth of cycles).
    pub fn clocks_cycles(&mut self, limit: usize) -> u64 {
        let mut cycles = 0_u64;
        while cycles < limit as u64 {
            cycles += self.clock() as u64;
        }
        cycles
    }

    /// Clocks the emulator until a complete frame has been presented
    /// (the PPU's mode-0 to mode-1 transition), returning the number
    /// of CPU T-cycles consumed — close to but not exactly
    /// [`GameBoy::LCD_CYCLES`], since the CPU clocks in whole
    /// instructions rather than single T-cycles.
    pub fn next_frame(&mut self) -> u32 {
        let mut cycles = 0_u32;
        loop {
            let step = self.cpu_clock() as u16;
            self.clock_devices(step);
            cycles += step as u32;
            if self.ppu().take_frame_ready() {
                self.present_frame();
                break;
            }
        }
        cycles
    }

    /// Equivalent to [`GameBoy::clock`] but breaks the loop pre-emptively
    /// if the PC reaches `addr` *before* the instruction executes,
    /// matching on the value the CPU had when this call started (used
    /// by [`GameBoy::step_to`] so devices are not clocked one extra
    /// time past the target address).
    pub fn clock_step(&mut self, addr: u16) -> u16 {
        let cycles = self.cpu_clock() as u16;
        if self.cpu_i().pc() == addr {
            return cycles;
        }
        self.clock_devices(cycles);
        if self.ppu().take_frame_ready() {
            self.present_frame();
        }
        cycles
    }

    /// Clocks the emulator one instruction at a time until the CPU's
    /// Program Counter reaches `addr`, returning the total T-cycles
    /// consumed. Used by scenario-style tests (e.g. running until the
    /// boot ROM hands control to the cartridge at 0x0100).
    pub fn step_to(&mut self, addr: u16) -> u32 {
        let mut cycles = 0_u32;
        while self.cpu_i().pc() != addr {
            cycles += self.clock_step(addr) as u32;
        }
        cycles
    }

    #[inline(always)]
    fn clock_devices(&mut self, cycles: u16) {
        if self.ppu_enabled {
            self.ppu_clock(cycles);
        }
        if self.apu_enabled {
            self.apu_clock(cycles);
        }
        if self.dma_enabled {
            self.dma_clock(cycles);
        }
        if self.timer_enabled {
            self.timer_clock(cycles);
        }
        if self.serial_enabled {
            self.serial_clock(cycles);
        }
    }

    fn present_frame(&mut self) {
        if let Some(callback) = self.present.as_mut() {
            callback(self.cpu.mmu().ppu().frame_buffer());
        }
    }

    /// Installs the host frame-presentation callback, invoked once per
    /// frame at the start of V-blank with the raw shade-index
    /// framebuffer (§6 frame presentation contract).
    pub fn set_present_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&[u8; FRAME_BUFFER_SIZE]) + 'static,
    {
        self.present = Some(Box::new(callback));
    }

    /// Presses `key` down, as described in §6: raises IF.JOYPAD and
    /// wakes the CPU from a STOP state.
    pub fn key_down(&mut self, key: PadKey) {
        self.pad().key_down(key);
    }

    /// Releases `key`.
    pub fn key_up(&mut self, key: PadKey) {
        self.pad().key_up(key);
    }

    pub fn cpu_clock(&mut self) -> u8 {
        self.cpu.clock()
    }

    pub fn ppu_clock(&mut self, cycles: u16) {
        self.ppu().clock(cycles)
    }

    pub fn apu_clock(&mut self, cycles: u16) {
        self.apu().clock(cycles)
    }

    pub fn dma_clock(&mut self, cycles: u16) {
        self.mmu().clock_dma(cycles);
    }

    pub fn timer_clock(&mut self, cycles: u16) {
        self.timer().clock(cycles)
    }

    pub fn serial_clock(&mut self, cycles: u16) {
        self.serial().clock(cycles)
    }

    /// Installs a 256-byte BIOS image, visible at 0x0000-0x00FF until
    /// the first write to 0xFF50 (§4.2). Fails load if `data` is not
    /// exactly [`BIOS_SIZE`] bytes.
    pub fn load_bios_data(&mut self, data: &[u8]) -> Result<(), Error> {
        if data.len() != BIOS_SIZE {
            return Err(Error::InvalidParameter(format!(
                "BIOS must be exactly {} bytes, got {}",
                BIOS_SIZE,
                data.len()
            )));
        }
        self.mmu().write_boot(0x0000, data);
        self.mmu().set_boot_active(true);
        Ok(())
    }

    /// Reads and installs a BIOS image from `path` (§6 file formats).
    pub fn load_bios_file(&mut self, path: &str) -> Result<(), Error> {
        let data = read_file(path)?;
        self.load_bios_data(&data)
    }

    /// Skips the boot sequence entirely, jumping straight to the post
    /// boot CPU/PPU state (§4.1 `boot()`), as if the BIOS had already
    /// run to completion.
    pub fn boot(&mut self) {
        self.cpu.boot();
    }

    /// Parses and installs `data` as the loaded cartridge.
    pub fn load_rom_data(
        &mut self,
        data: &[u8],
        ram_data: Option<&[u8]>,
    ) -> Result<&mut Cartridge, Error> {
        let mut rom = Cartridge::from_data(data)?;
        if let Some(ram_data) = ram_data {
            rom.set_ram_data(ram_data);
        }
        self.mmu().set_rom(rom);
        Ok(self.mmu().rom())
    }

    /// Reads and installs the ROM at `path`; if `save_path` is given
    /// (or, absent that, a `.sav` file next to the ROM exists) its
    /// contents seed the cartridge's external RAM battery mirror
    /// (§6 SAV file format).
    pub fn load_rom_file(
        &mut self,
        path: &str,
        save_path: Option<&str>,
    ) -> Result<&mut Cartridge, Error> {
        let data = read_file(path)?;
        self.load_rom_data(&data, None)?;
        let save_path = save_path
            .map(String::from)
            .or_else(|| replace_ext(path, "sav"));
        if let Some(save_path) = save_path {
            self.mmu().rom().load_save(&save_path)?;
        }
        Ok(self.mmu().rom())
    }

    /// Flushes the currently loaded cartridge's external RAM to its
    /// companion save file, if any and if the cartridge is battery
    /// backed (§4.3 teardown contract). Safe to call even when no
    /// save path was set, or the cartridge has no battery.
    pub fn flush_save(&self) -> Result<(), Error> {
        self.cpu.mmu_i().rom_i().flush_save()
    }

    pub fn attach_serial(&mut self, device: Box<dyn SerialDevice>) {
        self.serial().set_device(device);
    }

    pub fn attach_null_serial(&mut self) {
        self.attach_serial(Box::<NullDevice>::default());
    }

    pub fn read_memory(&mut self, addr: u16) -> u8 {
        self.mmu().read(addr)
    }

    pub fn write_memory(&mut self, addr: u16, value: u8) {
        self.mmu().write(addr, value);
    }

    pub fn cpu(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn cpu_i(&self) -> &Cpu {
        &self.cpu
    }

    pub fn mmu(&mut self) -> &mut Mmu {
        self.cpu.mmu()
    }

    pub fn mmu_i(&self) -> &Mmu {
        self.cpu.mmu_i()
    }

    pub fn ppu(&mut self) -> &mut Ppu {
        self.cpu.ppu()
    }

    pub fn ppu_i(&self) -> &Ppu {
        self.cpu.ppu_i()
    }

    pub fn apu(&mut self) -> &mut Apu {
        self.cpu.apu()
    }

    pub fn apu_i(&self) -> &Apu {
        self.cpu.apu_i()
    }

    pub fn dma(&mut self) -> &mut Dma {
        self.cpu.dma()
    }

    pub fn dma_i(&self) -> &Dma {
        self.cpu.dma_i()
    }

    pub fn pad(&mut self) -> &mut Pad {
        self.cpu.pad()
    }

    pub fn pad_i(&self) -> &Pad {
        self.cpu.pad_i()
    }

    pub fn timer(&mut self) -> &mut Timer {
        self.cpu.timer()
    }

    pub fn timer_i(&self) -> &Timer {
        self.cpu.timer_i()
    }

    pub fn serial(&mut self) -> &mut Serial {
        self.cpu.serial()
    }

    pub fn serial_i(&self) -> &Serial {
        self.cpu.serial_i()
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        self.mmu().rom()
    }

    pub fn rom_i(&self) -> &Cartridge {
        self.mmu_i().rom_i()
    }

    pub fn frame_buffer(&mut self) -> &[u8; FRAME_BUFFER_SIZE] {
        self.ppu().frame_buffer()
    }

    pub fn ppu_enabled(&self) -> bool {
        self.ppu_enabled
    }

    pub fn set_ppu_enabled(&mut self, value: bool) {
        self.ppu_enabled = value;
        self.gbc.lock().unwrap().set_ppu_enabled(value);
    }

    pub fn apu_enabled(&self) -> bool {
        self.apu_enabled
    }

    pub fn set_apu_enabled(&mut self, value: bool) {
        self.apu_enabled = value;
        self.gbc.lock().unwrap().set_apu_enabled(value);
    }

    pub fn dma_enabled(&self) -> bool {
        self.dma_enabled
    }

    pub fn set_dma_enabled(&mut self, value: bool) {
        self.dma_enabled = value;
        self.gbc.lock().unwrap().set_dma_enabled(value);
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn set_timer_enabled(&mut self, value: bool) {
        self.timer_enabled = value;
        self.gbc.lock().unwrap().set_timer_enabled(value);
    }

    pub fn serial_enabled(&self) -> bool {
        self.serial_enabled
    }

    pub fn set_serial_enabled(&mut self, value: bool) {
        self.serial_enabled = value;
        self.gbc.lock().unwrap().set_serial_enabled(value);
    }

    pub fn set_all_enabled(&mut self, value: bool) {
        self.set_ppu_enabled(value);
        self.set_apu_enabled(value);
        self.set_dma_enabled(value);
        self.set_timer_enabled(value);
        self.set_serial_enabled(value);
    }

    pub fn clock_freq(&self) -> u32 {
        self.clock_freq
    }

    pub fn set_clock_freq(&mut self, value: u32) {
        self.clock_freq = value;
        self.gbc.lock().unwrap().set_clock_freq(value);
    }

    pub fn clock_freq_s(&self) -> String {
        format!("{:.02} Mhz", self.clock_freq() as f32 / 1_000.0 / 1_000.0)
    }

    pub fn registers(&self) -> Registers {
        Registers {
            pc: self.cpu.pc(),
            sp: self.cpu.sp(),
            a: self.cpu.a,
            f: self.cpu.f(),
            b: self.cpu.b,
            c: self.cpu.c,
            d: self.cpu.d,
            e: self.cpu.e,
            h: self.cpu.h,
            l: self.cpu.l,
        }
    }

    pub fn title(&self) -> String {
        self.rom_i().title()
    }

    pub fn description(&self, column_length: usize) -> String {
        let version_l = format!("{:width$}", "Version", width = column_length);
        let clock_l = format!("{:width$}", "Clock", width = column_length);
        let title_l = format!("{:width$}", "Title", width = column_length);
        let serial_l = format!("{:width$}", "Serial", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}\n{}  {}",
            version_l,
            Info::version(),
            clock_l,
            self.clock_freq_s(),
            title_l,
            self.title(),
            serial_l,
            self.serial_i().device().description(),
        )
    }

    pub fn description_debug(&self) -> String {
        format!(
            "{}\nCPU:\n{}\nDMA:\n{}",
            self.description(12),
            self.cpu_i().description_default(),
            self.dma_i().description()
        )
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GameBoy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}
