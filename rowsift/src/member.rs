//! Member search over the member ⟕ team projection
//!
//! Members optionally belong to a team, so the projection is a left join: a
//! member without a team still appears, with NULL team columns.

use serde::{Deserialize, Serialize};

use crate::repository::{
    goe, loe, text_eq, FilterValue, OrderSpec, Predicate, Record, SearchCondition,
};

/// Qualified field: member id
pub const MEMBER_ID: &str = "member.id";
/// Qualified field: member username
pub const MEMBER_USERNAME: &str = "member.username";
/// Qualified field: member age
pub const MEMBER_AGE: &str = "member.age";
/// Qualified field: team id
pub const TEAM_ID: &str = "team.id";
/// Qualified field: team name
pub const TEAM_NAME: &str = "team.name";

/// Optional criteria for a member search
///
/// Every criterion is independent. Blank text and missing values impose no
/// constraint; present ones are combined with AND in the order
/// username, team name, minimum age, maximum age.
///
/// ```rust
/// use rowsift::member::MemberSearchCondition;
/// use rowsift::repository::SearchCondition;
///
/// let condition = MemberSearchCondition::new()
///     .with_team_name("teamB")
///     .with_age_goe(35);
/// assert_eq!(
///     condition.compose().unwrap().to_string(),
///     "team.name = 'teamB' AND member.age >= 35"
/// );
///
/// assert!(MemberSearchCondition::new().compose().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSearchCondition {
    /// Exact username
    pub username: Option<String>,
    /// Exact team name
    pub team_name: Option<String>,
    /// Minimum age, inclusive
    pub age_goe: Option<i32>,
    /// Maximum age, inclusive
    pub age_loe: Option<i32>,
}

impl MemberSearchCondition {
    /// A condition with no criteria
    pub fn new() -> Self {
        Self::default()
    }

    /// Require this username
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Require this team name
    #[must_use]
    pub fn with_team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    /// Require age >= `age`
    #[must_use]
    pub fn with_age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    /// Require age <= `age`
    #[must_use]
    pub fn with_age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }
}

impl SearchCondition for MemberSearchCondition {
    fn criteria(&self) -> Vec<Option<Predicate>> {
        vec![
            text_eq(MEMBER_USERNAME, self.username.as_deref()),
            text_eq(TEAM_NAME, self.team_name.as_deref()),
            goe(MEMBER_AGE, self.age_goe),
            loe(MEMBER_AGE, self.age_loe),
        ]
    }
}

/// One row of the member ⟕ team projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct MemberTeam {
    pub member_id: i64,
    pub username: Option<String>,
    pub age: i32,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub team_name: Option<String>,
}

impl Record for MemberTeam {
    const FIELDS: &'static [&'static str] =
        &[MEMBER_ID, MEMBER_USERNAME, MEMBER_AGE, TEAM_ID, TEAM_NAME];

    fn field(&self, name: &str) -> Option<FilterValue> {
        match name {
            MEMBER_ID => Some(self.member_id.into()),
            MEMBER_USERNAME => self.username.as_deref().map(Into::into),
            MEMBER_AGE => Some(self.age.into()),
            TEAM_ID => self.team_id.map(Into::into),
            TEAM_NAME => self.team_name.as_deref().map(Into::into),
            _ => None,
        }
    }
}

/// Age descending, then username ascending with unnamed members last
pub fn default_sort() -> Vec<OrderSpec> {
    vec![
        OrderSpec::desc(MEMBER_AGE),
        OrderSpec::asc(MEMBER_USERNAME).nulls_last(),
    ]
}

/// Four members split over two teams
///
/// `member1` (10) and `member2` (20) are in `teamA`; `member3` (30) and
/// `member4` (40) are in `teamB`.
pub fn sample_members() -> Vec<MemberTeam> {
    [
        ("member1", 10, 1, "teamA"),
        ("member2", 20, 1, "teamA"),
        ("member3", 30, 2, "teamB"),
        ("member4", 40, 2, "teamB"),
    ]
    .into_iter()
    .zip(1..)
    .map(|((username, age, team_id, team_name), member_id)| MemberTeam {
        member_id,
        username: Some(username.to_string()),
        age,
        team_id: Some(team_id),
        team_name: Some(team_name.to_string()),
    })
    .collect()
}

/// Statements for the member ⟕ team projection
///
/// Expects `member(id, username, age, team_id)` and `team(id, name)`.
#[cfg(feature = "database")]
pub fn member_team_source() -> crate::repository::TableSource {
    const JOIN: &str = "FROM member LEFT JOIN team ON team.id = member.team_id";
    crate::repository::TableSource::new(
        format!(
            "SELECT member.id AS member_id, member.username, member.age, \
             team.id AS team_id, team.name AS team_name {}",
            JOIN
        ),
        format!("SELECT COUNT(member.id) {}", JOIN),
    )
}
