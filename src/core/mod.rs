pub mod activity;
pub mod brain_dump;
pub mod calendar;
pub mod day_plan;
pub mod habit;
pub mod mood;
pub mod note;
pub mod settings;
pub mod shopping;
pub mod task;
pub mod temporal;

/// New record id. UUID v7 keeps ids time-ordered like the millisecond
/// tokens older builds generated.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_v7() {
        let id = new_id();
        assert_eq!(uuid::Uuid::parse_str(&id).unwrap().get_version_num(), 7);
        assert_ne!(id, new_id());
    }
}
