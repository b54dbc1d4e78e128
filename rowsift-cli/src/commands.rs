use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use rowsift::member::MemberSearchCondition;
use std::io;

use crate::Cli;

pub mod compose;
pub mod search;

/// Optional member criteria shared by `search` and `compose`
#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// Exact username; blank means no constraint
    #[arg(long)]
    pub username: Option<String>,

    /// Exact team name; blank means no constraint
    #[arg(long, value_name = "TEAM")]
    pub team: Option<String>,

    /// Minimum age, inclusive
    #[arg(long, value_name = "AGE", allow_negative_numbers = true)]
    pub age_goe: Option<i32>,

    /// Maximum age, inclusive
    #[arg(long, value_name = "AGE", allow_negative_numbers = true)]
    pub age_loe: Option<i32>,
}

impl CriteriaArgs {
    pub fn condition(&self) -> MemberSearchCondition {
        MemberSearchCondition {
            username: self.username.clone(),
            team_name: self.team.clone(),
            age_goe: self.age_goe,
            age_loe: self.age_loe,
        }
    }
}

pub fn completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "rowsift", &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rowsift::repository::SearchCondition;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_criteria_map_to_condition() {
        let cli = Cli::try_parse_from([
            "rowsift",
            "compose",
            "--team",
            "teamA",
            "--age-goe",
            "15",
        ])
        .unwrap();
        let crate::Commands::Compose(args) = cli.command else {
            panic!("expected compose");
        };
        assert_eq!(
            args.condition().compose().unwrap().to_string(),
            "team.name = 'teamA' AND member.age >= 15"
        );
    }
}
