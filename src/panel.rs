//! Keyboard tuning cursor over the parameter table.
//!
//! `Tab` / `Shift+Tab` move between parameters, `Up` / `Down` nudge the
//! selected one by its step and `R` restores its default.

use log::info;

use crate::binder::ParameterBinder;
use crate::input::{KeyCode, NamedKey};
use crate::params::{ParamError, ParamId, ParamKind, ParamValue, Rgb};

/// Per-channel step applied to colour parameters.
pub const COLOR_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Next,
    Previous,
    Increase,
    Decrease,
    Reset,
}

impl PanelCommand {
    pub fn from_key(key: KeyCode, shift: bool) -> Option<Self> {
        match key {
            KeyCode::Named(NamedKey::Tab) if shift => Some(Self::Previous),
            KeyCode::Named(NamedKey::Tab) => Some(Self::Next),
            KeyCode::Named(NamedKey::Up) => Some(Self::Increase),
            KeyCode::Named(NamedKey::Down) => Some(Self::Decrease),
            KeyCode::Character('R') => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TuningPanel {
    selected: usize,
}

impl TuningPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> ParamId {
        ParamId::ALL[self.selected]
    }

    /// Runs one command and returns the selected parameter's value afterwards.
    pub fn handle(
        &mut self,
        command: PanelCommand,
        binder: &mut ParameterBinder,
    ) -> Result<ParamValue, ParamError> {
        let count = ParamId::ALL.len();
        match command {
            PanelCommand::Next => self.selected = (self.selected + 1) % count,
            PanelCommand::Previous => self.selected = (self.selected + count - 1) % count,
            PanelCommand::Increase | PanelCommand::Decrease => {
                let id = self.selected();
                let up = command == PanelCommand::Increase;
                let value = nudge(id, binder.parameters().get(id), up);
                binder.set(id.name(), value)?;
            }
            PanelCommand::Reset => binder.reset(self.selected()),
        }

        let id = self.selected();
        let spec = id.spec();
        let value = binder.parameters().get(id);
        info!("{} / {} ({}) = {value}", spec.folder, spec.label, spec.name);
        Ok(value)
    }
}

/// Moves `current` one step; the binder clamps the result.
fn nudge(id: ParamId, current: ParamValue, up: bool) -> ParamValue {
    match (id.spec().kind, current) {
        (ParamKind::Float { step, .. }, ParamValue::Float(value)) => {
            let direction = if up { 1.0 } else { -1.0 };
            // Snap to the step grid so repeated nudges do not accumulate error.
            ParamValue::Float(((value / step).round() + direction) * step)
        }
        (ParamKind::Int { .. }, ParamValue::Int(value)) => ParamValue::Int(if up {
            value.saturating_add(1)
        } else {
            value.saturating_sub(1)
        }),
        (ParamKind::Color { .. }, ParamValue::Color(color)) => {
            let channel = |c: u8| {
                if up {
                    c.saturating_add(COLOR_STEP)
                } else {
                    c.saturating_sub(COLOR_STEP)
                }
            };
            ParamValue::Color(Rgb::new(channel(color.r), channel(color.g), channel(color.b)))
        }
        (_, other) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        let tab = KeyCode::Named(NamedKey::Tab);
        assert_eq!(PanelCommand::from_key(tab, false), Some(PanelCommand::Next));
        assert_eq!(PanelCommand::from_key(tab, true), Some(PanelCommand::Previous));
        assert_eq!(
            PanelCommand::from_key(KeyCode::Character('R'), false),
            Some(PanelCommand::Reset)
        );
        assert_eq!(PanelCommand::from_key(KeyCode::Character('Q'), false), None);
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut panel = TuningPanel::new();
        let mut binder = ParameterBinder::default();
        panel.handle(PanelCommand::Previous, &mut binder).unwrap();
        assert_eq!(panel.selected(), ParamId::EnvMapBlur);
        panel.handle(PanelCommand::Next, &mut binder).unwrap();
        assert_eq!(panel.selected(), ParamId::PupilSize);
    }

    #[test]
    fn nudges_follow_the_step_and_clamp() {
        let mut panel = TuningPanel::new();
        let mut binder = ParameterBinder::default();
        let value = panel.handle(PanelCommand::Increase, &mut binder).unwrap();
        match value {
            ParamValue::Float(v) => assert!((v - 0.16).abs() < 1e-6),
            other => panic!("unexpected {other:?}"),
        }
        for _ in 0..50 {
            panel.handle(PanelCommand::Increase, &mut binder).unwrap();
        }
        assert_eq!(binder.parameters().float(ParamId::PupilSize), 0.3);
        panel.handle(PanelCommand::Reset, &mut binder).unwrap();
        assert_eq!(binder.parameters().float(ParamId::PupilSize), 0.15);
    }

    #[test]
    fn colours_move_all_channels() {
        let mut panel = TuningPanel::new();
        let mut binder = ParameterBinder::default();
        panel.handle(PanelCommand::Next, &mut binder).unwrap();
        assert_eq!(panel.selected(), ParamId::PupilColor);
        let value = panel.handle(PanelCommand::Increase, &mut binder).unwrap();
        assert_eq!(value, ParamValue::Color(Rgb::new(5, 5, 5)));
        panel.handle(PanelCommand::Decrease, &mut binder).unwrap();
        let value = panel.handle(PanelCommand::Decrease, &mut binder).unwrap();
        assert_eq!(value, ParamValue::Color(Rgb::new(0, 0, 0)));
    }

    #[test]
    fn octaves_stay_in_range() {
        let mut binder = ParameterBinder::default();
        let mut panel = TuningPanel::new();
        while panel.selected() != ParamId::VeinOctaves {
            panel.handle(PanelCommand::Next, &mut binder).unwrap();
        }
        panel.handle(PanelCommand::Increase, &mut binder).unwrap();
        assert_eq!(binder.parameters().octaves(ParamId::VeinOctaves), 5);
        for _ in 0..10 {
            panel.handle(PanelCommand::Decrease, &mut binder).unwrap();
        }
        assert_eq!(binder.parameters().octaves(ParamId::VeinOctaves), 1);
    }
}
