use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rowsift::config::Config;
use rowsift::member::{default_sort, sample_members, MemberTeam};
use rowsift::repository::{
    fetch_page, parse_sort, Instrumented, MemoryExecutor, PageRequest, SearchCondition,
};

use super::CriteriaArgs;
use crate::utils::{self, format, SearchOutput};

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Rows to skip
    #[arg(long, allow_negative_numbers = true, conflicts_with = "page")]
    pub offset: Option<i64>,

    /// Page size, clamped to `pagination.max_limit`
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// 1-indexed page number, as an alternative to --offset
    #[arg(long)]
    pub page: Option<u64>,

    /// Ordering, e.g. "member.age:desc,member.username:asc:nulls_last"
    #[arg(long)]
    pub sort: Option<String>,

    /// JSON file holding an array of member rows; defaults to built-in sample data
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Print the page as JSON
    #[arg(long)]
    pub json: bool,
}

fn build_request(args: &SearchArgs, config: &Config) -> Result<PageRequest> {
    let sort = match &args.sort {
        Some(sort) => parse_sort(sort)?,
        None => default_sort(),
    };
    let request = match args.page {
        Some(page) => config.pagination.numbered_page(page, args.limit)?,
        None => config.pagination.page_request(args.offset, args.limit)?,
    };
    Ok(request.with_sort(sort))
}

pub async fn execute(args: SearchArgs, config: &Config) -> Result<()> {
    let rows: Vec<MemberTeam> = match &args.data {
        Some(path) => utils::load_rows(path)?,
        None => sample_members(),
    };
    tracing::debug!(rows = rows.len(), "Loaded member rows");

    let output = search(rows, &args, config).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_page(&output);
    }
    Ok(())
}

async fn search(
    rows: Vec<MemberTeam>,
    args: &SearchArgs,
    config: &Config,
) -> Result<SearchOutput<MemberTeam>> {
    let request = build_request(args, config)?;
    let filter = args.criteria.condition().compose();

    let executor = Instrumented::new(MemoryExecutor::new(rows));
    let page = fetch_page(&executor, filter.as_ref(), &request).await?;

    Ok(SearchOutput {
        filter: filter.map(|f| f.to_string()),
        meta: page.meta(),
        count_query: executor.count_calls() > 0,
        content: page.into_content(),
    })
}

fn print_page(output: &SearchOutput<MemberTeam>) {
    let filter = output.filter.as_deref().unwrap_or("(no filter)");
    println!("{} {}", "Filter:".bold(), filter);
    println!();

    if output.content.is_empty() {
        println!("{}", "No members on this page".dimmed());
    } else {
        println!("{}", format::member_header().bold());
        for member in &output.content {
            println!("{}", format::member_line(member));
        }
    }

    println!();
    println!("{}", format::page_summary(&output.meta, output.content.len()));
    let count = if output.count_query {
        "issued".yellow()
    } else {
        "elided".green()
    };
    println!("{} {}", "Count query:".bold(), count);
}
