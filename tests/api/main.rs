mod admin;
mod books;
mod github;
mod health_check;
mod helpers;
mod papers;
mod study_guides;
mod surveys;
