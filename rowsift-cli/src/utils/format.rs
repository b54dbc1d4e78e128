use rowsift::member::MemberTeam;
use rowsift::repository::PaginationMeta;

pub fn member_header() -> String {
    format!("{:>4}  {:<16} {:>4}  {:<12}", "ID", "USERNAME", "AGE", "TEAM")
}

pub fn member_line(member: &MemberTeam) -> String {
    format!(
        "{:>4}  {:<16} {:>4}  {:<12}",
        member.member_id,
        member.username.as_deref().unwrap_or("-"),
        member.age,
        member.team_name.as_deref().unwrap_or("-"),
    )
}

/// e.g. `rows 3-4 of 4 (page 2 of 2)`
pub fn page_summary(meta: &PaginationMeta, shown: usize) -> String {
    if shown == 0 {
        return format!(
            "no rows at offset {} ({} total, {} page(s))",
            meta.offset, meta.total, meta.total_pages
        );
    }
    format!(
        "rows {}-{} of {} (page {} of {})",
        meta.offset + 1,
        meta.offset + shown as u64,
        meta.total,
        meta.page,
        meta.total_pages
    )
}
