use anyhow::Result;
use colored::Colorize;
use rowsift::repository::{Predicate, SearchCondition};

use super::CriteriaArgs;

pub fn execute(args: &CriteriaArgs) -> Result<()> {
    let filter = args.condition().compose();
    tracing::debug!(filter = ?filter.as_ref().map(ToString::to_string), "Composed filter");
    println!("{}", render(filter.as_ref()));
    Ok(())
}

/// One line per condition, in evaluation order
fn render(filter: Option<&Predicate>) -> String {
    match filter {
        None => "(no filter)".dimmed().to_string(),
        Some(predicate) => predicate
            .conditions()
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let joiner = if i == 0 { "WHERE" } else { "  AND" };
                format!("{} {}", joiner.cyan(), c)
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(filter: Option<&Predicate>) -> String {
        colored::control::set_override(false);
        render(filter)
    }

    #[test]
    fn test_render_no_filter() {
        assert_eq!(plain(None), "(no filter)");
    }

    #[test]
    fn test_render_conditions_in_order() {
        let args = CriteriaArgs {
            username: Some("member1".to_string()),
            team: Some("  ".to_string()),
            age_goe: None,
            age_loe: Some(30),
        };
        let filter = args.condition().compose();
        assert_eq!(
            plain(filter.as_ref()),
            "WHERE member.username = 'member1'\n  AND member.age <= 30"
        );
    }
}
