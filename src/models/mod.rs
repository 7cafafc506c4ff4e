pub mod analytics;
pub mod books;
pub mod listing;
pub mod pagination;
pub mod papers;
pub mod resource_usage;
pub mod study_guides;
pub mod surveys;
pub mod uploads;
