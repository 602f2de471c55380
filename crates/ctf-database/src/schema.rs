/// DDL surface a repository module exposes to [`crate::migrate`].
///
/// Six small tables, no bulk ingestion — no `Streamable`/`Row`/`Hydrate`
/// associated items for binary-COPY loads are needed here (see DESIGN.md).
pub trait Schema {
    /// Table name this schema governs.
    const NAME: &'static str;
    /// `CREATE TABLE IF NOT EXISTS` statement(s).
    const CREATE: &'static str;
    /// Supporting index statement(s), empty string if none are needed.
    const INDICES: &'static str;
}
