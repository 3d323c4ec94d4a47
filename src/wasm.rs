//! WebAssembly bindings.
//!
//! A browser host owns the frame loop: it calls `advance_frame` from
//! `requestAnimationFrame`, forwards key events and paints `framebuffer()`.

use crate::cpu::framebuffer::{HEIGHT, WIDTH};
use crate::MachineState;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// JavaScript-facing machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: MachineState,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Build a machine from a ROM image and a seed.
    #[wasm_bindgen(constructor)]
    pub fn new(rom: &[u8], seed: u64) -> Result<WasmMachine, JsError> {
        let machine = MachineState::new(rom, seed).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self { machine })
    }

    /// Run one frame at `hz`. Returns the number of instructions executed.
    #[wasm_bindgen]
    pub fn advance_frame(&mut self, hz: u32) -> Result<u32, JsError> {
        self.machine
            .advance_frame(hz)
            .map_err(|e| JsError::new(&format!("PC={:#05x}: {}", self.machine.regs.pc, e)))
    }

    #[wasm_bindgen]
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.machine.set_key(key, pressed);
    }

    /// Pixels as row-major bytes, 1 for lit and 0 for dark.
    #[wasm_bindgen]
    pub fn framebuffer(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.machine.framebuffer().to_row_major().as_slice())
    }

    #[wasm_bindgen]
    pub fn width(&self) -> usize {
        WIDTH
    }

    #[wasm_bindgen]
    pub fn height(&self) -> usize {
        HEIGHT
    }

    #[wasm_bindgen]
    pub fn sound_active(&self) -> bool {
        self.machine.is_sound_active()
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.machine.regs.pc
    }

    /// Value of register `V(i & 0xF)`.
    #[wasm_bindgen]
    pub fn register(&self, i: u8) -> u8 {
        self.machine.regs.v[(i & 0xF) as usize]
    }

    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.machine.cycles
    }

    /// Restart from the loaded ROM with the original seed.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// Registers as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.machine.regs).map_err(|e| JsError::new(&e.to_string()))
    }
}
