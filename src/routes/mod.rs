use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;

use admin::{dashboard, list_surveys, survey_analytics, usage_summary};
use auth::me;
use books::{delete_book, download_book, get_book, list_books, update_book, upload_book};
use github::upload_to_repository;
use papers::{delete_paper, download_paper, get_paper, list_papers, update_paper, upload_paper};
use study_guides::{
    delete_study_guide, download_study_guide, get_study_guide, list_study_guides,
    update_study_guide, upload_study_guide,
};
use surveys::submit_survey;

mod admin;
mod auth;
mod books;
mod catalog;
mod github;
mod health_check;
mod papers;
mod study_guides;
mod surveys;
pub mod uploads;

fn papers_routes() -> Scope {
    scope("papers")
        .service(list_papers)
        .service(upload_paper)
        .service(download_paper)
        .service(get_paper)
        .service(update_paper)
        .service(delete_paper)
}

fn books_routes() -> Scope {
    scope("books")
        .service(list_books)
        .service(upload_book)
        .service(download_book)
        .service(get_book)
        .service(update_book)
        .service(delete_book)
}

fn study_guides_routes() -> Scope {
    scope("study-guides")
        .service(list_study_guides)
        .service(upload_study_guide)
        .service(download_study_guide)
        .service(get_study_guide)
        .service(update_study_guide)
        .service(delete_study_guide)
}

fn admin_routes() -> Scope {
    scope("admin")
        .service(survey_analytics)
        .service(list_surveys)
        .service(usage_summary)
        .service(dashboard)
}

pub fn library_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(papers_routes())
            .service(books_routes())
            .service(study_guides_routes())
            .service(scope("surveys").service(submit_survey))
            .service(admin_routes())
            .service(scope("github").service(upload_to_repository))
            .service(scope("auth").service(me))
            .service(health_check::health_check),
    );
}
