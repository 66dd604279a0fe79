//! Command catalog shared by the parser and the help printer.
//!
//! Keeping names, aliases and usage lines in one table means `help` output
//! and parse errors always agree with what the parser accepts.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandTag {
    Strike,
    Step,
    Run,
    Peaks,
    Status,
    Help,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub tag: CommandTag,
    pub usage: &'static str,
    pub summary: &'static str,
}

impl CommandSpec {
    fn matches(&self, keyword: &str) -> bool {
        self.name.eq_ignore_ascii_case(keyword)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(keyword))
    }
}

pub const COMMANDS: [CommandSpec; 7] = [
    CommandSpec {
        name: "strike",
        aliases: &["hit"],
        tag: CommandTag::Strike,
        usage: "strike <channel> [velocity]",
        summary: "excite one simulated bar; velocity defaults to 600",
    },
    CommandSpec {
        name: "step",
        aliases: &[],
        tag: CommandTag::Step,
        usage: "step [cycles]",
        summary: "run scan cycles on logical time (default 1)",
    },
    CommandSpec {
        name: "run",
        aliases: &[],
        tag: CommandTag::Run,
        usage: "run <duration>",
        summary: "scan in real time, e.g. `run 500ms` or `run 2s`",
    },
    CommandSpec {
        name: "peaks",
        aliases: &[],
        tag: CommandTag::Peaks,
        usage: "peaks",
        summary: "print the current peak-hold table",
    },
    CommandSpec {
        name: "status",
        aliases: &[],
        tag: CommandTag::Status,
        usage: "status",
        summary: "print per-channel detector state",
    },
    CommandSpec {
        name: "help",
        aliases: &["?"],
        tag: CommandTag::Help,
        usage: "help [command]",
        summary: "list commands or describe one",
    },
    CommandSpec {
        name: "exit",
        aliases: &["quit"],
        tag: CommandTag::Exit,
        usage: "exit",
        summary: "leave the console",
    },
];

/// Looks up a command by name or alias, ignoring ASCII case.
#[must_use]
pub fn find(keyword: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.matches(keyword))
}

/// Catalog entry for `tag`.
#[must_use]
pub fn spec_for(tag: CommandTag) -> &'static CommandSpec {
    match tag {
        CommandTag::Strike => &COMMANDS[0],
        CommandTag::Step => &COMMANDS[1],
        CommandTag::Run => &COMMANDS[2],
        CommandTag::Peaks => &COMMANDS[3],
        CommandTag::Status => &COMMANDS[4],
        CommandTag::Help => &COMMANDS[5],
        CommandTag::Exit => &COMMANDS[6],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_for_matches_table_order() {
        for spec in &COMMANDS {
            assert_eq!(spec_for(spec.tag), spec);
        }
    }

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(find("QUIT").map(|spec| spec.tag), Some(CommandTag::Exit));
        assert_eq!(find("Hit").map(|spec| spec.tag), Some(CommandTag::Strike));
        assert!(find("calibrate").is_none());
    }
}
