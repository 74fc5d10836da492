//! Resource API Routes
//!
//! Every collection is served under `/api/v1/{collection}`:
//! - `GET /` lists with filters, `select`, `sort`, `page` and `limit`
//! - `POST /` creates
//! - `GET|PUT|DELETE /{id}` reads, merges or deletes one document
//!
//! Bootcamps additionally expose radius search and their courses.

use crate::api::handlers::{radius, resources};
use crate::models::Collection;
use crate::state::AppState;
use axum::{routing::get, Extension, Router};

pub fn resource_routes() -> Router<AppState> {
    Collection::ALL
        .into_iter()
        .fold(Router::new(), |router, collection| {
            router.nest(
                &format!("/{}", collection.as_str()),
                collection_routes(collection),
            )
        })
}

fn collection_routes(collection: Collection) -> Router<AppState> {
    let mut router = Router::new()
        .route(
            "/",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route(
            "/:id",
            get(resources::get_resource)
                .put(resources::update_resource)
                .delete(resources::delete_resource),
        );

    if collection == Collection::Bootcamps {
        router = router
            .route(
                "/radius/:zipcode/:distance",
                get(radius::bootcamps_in_radius),
            )
            .route("/:id/courses", get(resources::bootcamp_courses));
    }

    router.layer(Extension(collection))
}
