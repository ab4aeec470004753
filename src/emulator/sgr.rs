//! SGR and color stack commands
//!
//! Each parameter run is consumed left to right; a code that needs extra
//! parameters (38/48) takes them from the same cursor.

use super::{ConsoleApi, EmulatorState, ParamCursor, SgrError};
use crate::ansi::{code, AnsiColor, StackCode};

/// Which color slot a command addresses before inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Fg,
    Bg,
}

impl EmulatorState {
    /// Console slot that currently displays `slot`
    fn physical(&self, slot: Slot) -> Slot {
        match (slot, self.inverted) {
            (Slot::Fg, true) => Slot::Bg,
            (Slot::Bg, true) => Slot::Fg,
            (s, false) => s,
        }
    }

    fn get<C: ConsoleApi + ?Sized>(&self, console: &C, slot: Slot) -> AnsiColor {
        match self.physical(slot) {
            Slot::Fg => console.foreground(),
            Slot::Bg => console.background(),
        }
    }

    fn set<C: ConsoleApi + ?Sized>(&self, console: &mut C, slot: Slot, color: AnsiColor) {
        match self.physical(slot) {
            Slot::Fg => console.set_foreground(color),
            Slot::Bg => console.set_background(color),
        }
    }

    fn set_inverted<C: ConsoleApi + ?Sized>(&mut self, console: &mut C, inverted: bool) {
        if self.inverted != inverted {
            let (fg, bg) = (console.foreground(), console.background());
            console.set_foreground(bg);
            console.set_background(fg);
            self.inverted = inverted;
        }
    }
}

pub(super) fn apply_sgr<C>(state: &mut EmulatorState, console: &mut C, params: &[u32]) -> Result<(), SgrError>
where
    C: ConsoleApi + ?Sized,
{
    if params.is_empty() {
        reset(state, console);
        return Ok(());
    }

    let mut cursor = ParamCursor::new(params);
    while let Some(code) = cursor.next() {
        apply_code(state, console, code, &mut cursor)?;
    }
    Ok(())
}

fn reset<C: ConsoleApi + ?Sized>(state: &mut EmulatorState, console: &mut C) {
    state.reset();
    console.reset_colors();
}

fn apply_code<C>(state: &mut EmulatorState, console: &mut C, sgr: u32, params: &mut ParamCursor<'_>) -> Result<(), SgrError>
where
    C: ConsoleApi + ?Sized,
{
    match sgr {
        code::RESET => reset(state, console),
        code::INVERT => state.set_inverted(console, true),
        code::NO_INVERT | code::NO_INVERT_ALT => state.set_inverted(console, false),
        // Styles the console API has no way to show
        1..=6 | 8 | 9 | 21..=25 | 28 | 29 => {
            tracing::trace!(code = sgr, "style has no console equivalent");
        }
        code::FG_DEFAULT => {
            let (fg, _) = console.default_colors();
            state.set(console, Slot::Fg, fg);
        }
        code::BG_DEFAULT => {
            let (_, bg) = console.default_colors();
            state.set(console, Slot::Bg, bg);
        }
        code::FG_EXTENDED => {
            let color = extended_color(sgr, params)?;
            state.set(console, Slot::Fg, color);
        }
        code::BG_EXTENDED => {
            let color = extended_color(sgr, params)?;
            state.set(console, Slot::Bg, color);
        }
        30..=37 | 90..=97 => {
            if let Some(color) = AnsiColor::from_fg_code(sgr) {
                state.set(console, Slot::Fg, color);
            }
        }
        40..=47 | 100..=107 => {
            if let Some(color) = AnsiColor::from_bg_code(sgr) {
                state.set(console, Slot::Bg, color);
            }
        }
        _ => return Err(SgrError::Unrecognized { code: sgr }),
    }
    Ok(())
}

/// Decode the parameters following 38/48
fn extended_color(sgr: u32, params: &mut ParamCursor<'_>) -> Result<AnsiColor, SgrError> {
    let mode = params.take_params(sgr, 1)?[0];
    match mode {
        code::MODE_INDEXED => {
            let index = params.take_params(sgr, 1)?[0];
            AnsiColor::from_index(index).ok_or(SgrError::PaletteIndex { index })
        }
        code::MODE_RGB => {
            let rgb = params.take_params(sgr, 3)?;
            Ok(AnsiColor::nearest(clamp(rgb[0]), clamp(rgb[1]), clamp(rgb[2])))
        }
        mode => Err(SgrError::ColorMode { code: sgr, mode }),
    }
}

fn clamp(v: u32) -> u8 {
    v.min(u8::MAX as u32) as u8
}

pub(super) fn apply_stack<C>(state: &mut EmulatorState, console: &mut C, params: &[u32]) -> Result<(), SgrError>
where
    C: ConsoleApi + ?Sized,
{
    for code in params.iter().copied() {
        match StackCode::from_code(code) {
            Some(StackCode::PushFg) => {
                let color = state.get(console, Slot::Fg);
                state.fg_stack.push(color);
            }
            Some(StackCode::PushBg) => {
                let color = state.get(console, Slot::Bg);
                state.bg_stack.push(color);
            }
            Some(StackCode::PopFg) => {
                if let Some(color) = state.fg_stack.pop() {
                    state.set(console, Slot::Fg, color);
                }
            }
            Some(StackCode::PopBg) => {
                if let Some(color) = state.bg_stack.pop() {
                    state.set(console, Slot::Bg, color);
                }
            }
            None => return Err(SgrError::UnrecognizedStack { code }),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::HeadlessConsole;

    fn setup() -> (EmulatorState, HeadlessConsole) {
        (EmulatorState::new(), HeadlessConsole::new(10, 2))
    }

    #[test]
    fn test_basic_colors() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[31, 44]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::Red);
        assert_eq!(console.background(), AnsiColor::Blue);
    }

    #[test]
    fn test_bright_colors() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[92, 103]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::BrightGreen);
        assert_eq!(console.background(), AnsiColor::BrightYellow);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[31, 7]).unwrap();
        apply_stack(&mut state, &mut console, &[10]).unwrap();
        apply_sgr(&mut state, &mut console, &[0]).unwrap();
        assert!(!state.is_inverted());
        assert!(state.fg_stack().is_empty());
        assert_eq!(console.foreground(), AnsiColor::White);
        assert_eq!(console.background(), AnsiColor::Black);
    }

    #[test]
    fn test_empty_params_reset() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[35]).unwrap();
        apply_sgr(&mut state, &mut console, &[]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::White);
    }

    #[test]
    fn test_invert_swaps_slots() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[7]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::Black);
        assert_eq!(console.background(), AnsiColor::White);

        apply_sgr(&mut state, &mut console, &[31]).unwrap();
        assert_eq!(console.background(), AnsiColor::Red);

        apply_sgr(&mut state, &mut console, &[27]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::Red);
        assert_eq!(console.background(), AnsiColor::Black);
    }

    #[test]
    fn test_legacy_invert_off() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[26]).unwrap();
        assert!(!state.is_inverted());
        assert_eq!(console.foreground(), AnsiColor::White);

        apply_sgr(&mut state, &mut console, &[7, 31]).unwrap();
        assert!(state.is_inverted());
        apply_sgr(&mut state, &mut console, &[26]).unwrap();
        assert!(!state.is_inverted());
        assert_eq!(console.foreground(), AnsiColor::Red);
        assert_eq!(console.background(), AnsiColor::Black);
    }

    #[test]
    fn test_default_colors_respect_invert() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[33, 7, 39]).unwrap();
        assert_eq!(console.background(), AnsiColor::White);
    }

    #[test]
    fn test_indexed_color() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[38, 5, 9, 48, 5, 4]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::BrightRed);
        assert_eq!(console.background(), AnsiColor::Blue);
    }

    #[test]
    fn test_indexed_color_out_of_palette() {
        let (mut state, mut console) = setup();
        let err = apply_sgr(&mut state, &mut console, &[38, 5, 200]).unwrap_err();
        assert_eq!(err, SgrError::PaletteIndex { index: 200 });
    }

    #[test]
    fn test_rgb_maps_to_nearest() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[38, 2, 255, 0, 0, 1]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::BrightRed);
    }

    #[test]
    fn test_extended_color_needs_parameters() {
        let (mut state, mut console) = setup();
        assert!(matches!(
            apply_sgr(&mut state, &mut console, &[38]),
            Err(SgrError::Format { code: 38, .. })
        ));
        assert!(matches!(
            apply_sgr(&mut state, &mut console, &[48, 2, 1, 2]),
            Err(SgrError::Format { code: 48, .. })
        ));
        assert!(matches!(
            apply_sgr(&mut state, &mut console, &[38, 5]),
            Err(SgrError::Format { code: 38, .. })
        ));
    }

    #[test]
    fn test_extended_color_bad_mode() {
        let (mut state, mut console) = setup();
        assert_eq!(
            apply_sgr(&mut state, &mut console, &[38, 3, 1]),
            Err(SgrError::ColorMode { code: 38, mode: 3 })
        );
    }

    #[test]
    fn test_unrecognized_code() {
        let (mut state, mut console) = setup();
        assert_eq!(
            apply_sgr(&mut state, &mut console, &[58]),
            Err(SgrError::Unrecognized { code: 58 })
        );
    }

    #[test]
    fn test_styles_accepted() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[1, 3, 4, 22, 23, 24]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::White);
    }

    #[test]
    fn test_push_pop_restores() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[32]).unwrap();
        apply_stack(&mut state, &mut console, &[10, 11]).unwrap();
        apply_sgr(&mut state, &mut console, &[31, 45]).unwrap();
        apply_stack(&mut state, &mut console, &[20, 21]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::Green);
        assert_eq!(console.background(), AnsiColor::Black);
    }

    #[test]
    fn test_pop_empty_is_noop() {
        let (mut state, mut console) = setup();
        apply_sgr(&mut state, &mut console, &[36]).unwrap();
        apply_stack(&mut state, &mut console, &[20, 21]).unwrap();
        assert_eq!(console.foreground(), AnsiColor::Cyan);
    }

    #[test]
    fn test_unknown_stack_code() {
        let (mut state, mut console) = setup();
        assert_eq!(
            apply_stack(&mut state, &mut console, &[12]),
            Err(SgrError::UnrecognizedStack { code: 12 })
        );
    }
}
