use crate::application::post_service::{PostQuery, PostService};
use crate::data::post_repository::JsonPostRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{
    CreatePostRequest, DeletedResponse, ListPostsQuery, UpdatePostRequest,
};
use crate::presentation::utils::request_id;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;

#[get("/posts")]
pub async fn get_posts(
    req: HttpRequest,
    posts: web::Data<PostService<JsonPostRepository>>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let query = PostQuery::from(query.into_inner());
    let page = posts.list_posts(&query).await?;

    info!(
        request_id = %request_id(&req),
        total = page.pagination.total,
        "posts retrieved"
    );

    Ok(HttpResponse::Ok().json(page))
}

#[get("/posts/stats/summary")]
pub async fn get_stats(
    posts: web::Data<PostService<JsonPostRepository>>,
) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(posts.stats().await?))
}

#[get("/posts/{id}")]
pub async fn get_post(
    posts: web::Data<PostService<JsonPostRepository>>,
    path: web::Path<u64>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[post("/posts")]
pub async fn create_post(
    req: HttpRequest,
    posts: web::Data<PostService<JsonPostRepository>>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .create_post(payload.into_inner().into_new_post()?)
        .await?;

    info!(
        request_id = %request_id(&req),
        post_id = post.id,
        "post created"
    );

    Ok(HttpResponse::Created().json(post))
}

#[put("/posts/{id}")]
pub async fn update_post(
    req: HttpRequest,
    posts: web::Data<PostService<JsonPostRepository>>,
    payload: web::Json<UpdatePostRequest>,
    path: web::Path<u64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = posts
        .update_post(post_id, payload.into_inner().into())
        .await?;

    info!(
        request_id = %request_id(&req),
        post_id,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(post))
}

#[delete("/posts/{id}")]
pub async fn delete_post(
    req: HttpRequest,
    posts: web::Data<PostService<JsonPostRepository>>,
    path: web::Path<u64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete_post(post_id).await?;

    info!(
        request_id = %request_id(&req),
        post_id,
        "post deleted"
    );

    Ok(HttpResponse::Ok().json(DeletedResponse {
        deleted_id: post_id,
    }))
}

#[post("/posts/{id}/publish")]
pub async fn publish_post(
    req: HttpRequest,
    posts: web::Data<PostService<JsonPostRepository>>,
    path: web::Path<u64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = posts.publish_post(post_id).await?;

    info!(
        request_id = %request_id(&req),
        post_id,
        "post published"
    );

    Ok(HttpResponse::Ok().json(post))
}
