//! Scripted command timelines.

use anyhow::Context;
use flyover_core::{CameraMode, Command, OverviewScope, ViewSide};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A command and the simulated time it fires at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedCommand {
    pub at_s: f64,
    pub command: Command,
}

/// Commands ordered by time, consumed as the simulation clock passes them.
#[derive(Debug, Clone, Default)]
pub struct Script {
    commands: Vec<ScriptedCommand>,
    next: usize,
}

impl Script {
    pub fn new(mut commands: Vec<ScriptedCommand>) -> Self {
        commands.retain(|c| c.at_s.is_finite());
        commands.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
        Self { commands, next: 0 }
    }

    /// Parse a JSON array of `{"at_s": .., "command": {"type": ..}}` entries.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let commands: Vec<ScriptedCommand> =
            serde_json::from_str(text).context("invalid command script")?;
        Ok(Self::new(commands))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.commands.len()
    }

    /// Commands whose time has come, in order. Each is returned once.
    pub fn due(&mut self, elapsed_s: f64) -> Vec<Command> {
        let mut due = Vec::new();
        while let Some(entry) = self.commands.get(self.next) {
            if entry.at_s > elapsed_s {
                break;
            }
            due.push(entry.command.clone());
            self.next += 1;
        }
        due
    }
}

fn at(at_s: f64, command: Command) -> ScriptedCommand {
    ScriptedCommand { at_s, command }
}

fn set_mode(mode: CameraMode) -> Command {
    Command::SetMode {
        mode: mode.as_str().to_string(),
    }
}

/// Two-minute tour through every mode, a user drag and a scrub.
pub fn demo_script() -> Script {
    Script::new(vec![
        at(0.0, Command::Play),
        at(15.0, set_mode(CameraMode::SideView)),
        at(30.0, Command::UserInteractionStart),
        at(33.0, Command::UserInteractionEnd),
        at(42.0, Command::SetOverviewScope {
            scope: OverviewScope::Local,
        }),
        at(45.0, Command::BeginScrub),
        at(45.5, Command::UpdateScrub { progress: 0.55 }),
        at(46.5, Command::UpdateScrub { progress: 0.65 }),
        at(48.0, Command::EndScrub),
        at(55.0, set_mode(CameraMode::Cinematic)),
        at(75.0, set_mode(CameraMode::BirdsEye)),
        at(85.0, Command::SetZoom { factor: 1.6 }),
        at(90.0, Command::Seek { progress: 0.25 }),
        at(95.0, set_mode(CameraMode::SideView)),
        at(96.0, Command::SetSidePin {
            side: Some(ViewSide::Left),
        }),
        at(105.0, set_mode(CameraMode::Chase)),
        at(106.0, Command::SetChasePitch { degrees: -45.0 }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_releases_commands_in_time_order() {
        let mut script = Script::from_json(
            r#"[
                {"at_s": 5.0, "command": {"type": "pause"}},
                {"at_s": 0.0, "command": {"type": "play"}},
                {"at_s": 2.5, "command": {"type": "seek", "progress": 0.5}}
            ]"#,
        )
        .unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(script.due(0.0), vec![Command::Play]);
        assert!(script.due(1.0).is_empty());
        assert_eq!(
            script.due(10.0),
            vec![Command::Seek { progress: 0.5 }, Command::Pause]
        );
        assert!(script.is_finished());
        assert!(script.due(20.0).is_empty());
    }

    #[test]
    fn test_bad_script_is_an_error() {
        assert!(Script::from_json(r#"[{"at_s": 1.0, "command": {"type": "fly"}}]"#).is_err());
        assert!(Script::from_json("not json").is_err());
    }

    #[test]
    fn test_demo_script_starts_playing_and_uses_known_modes() {
        let mut script = demo_script();
        assert_eq!(script.due(0.0), vec![Command::Play]);
        let rest = script.due(f64::MAX);
        for command in rest {
            if let Command::SetMode { mode } = command {
                assert!(mode.parse::<CameraMode>().is_ok(), "{}", mode);
            }
        }
    }
}
