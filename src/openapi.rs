use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ApiErrorBody;
use crate::models::{
    Award, AwardUpdate, BoxOffice, BoxOfficeUpdate, Crew, CrewRole, CrewUpdate, Discussion, DiscussionCategory,
    FilmographyEntry, ListUpdate, LoginRequest, Movie, MovieList, MovieUpdate, NewAward, NewCrew, NewDiscussion,
    NewList, NewMovie, NewNews, NewReply, NewSubscription, News, NewsCategory, NewsUpdate, NotificationType,
    ProfileUpdate, PublicUser, RegisterRequest, Reply, Review, ReviewInput, Subscription, UserRating,
};
use crate::routes;

/// Registers the `bearer` scheme referenced by protected operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::register,
        routes::auth::login,
        routes::auth::register_admin,
        routes::users::me,
        routes::users::update_profile,
        routes::users::add_to_wishlist,
        routes::users::non_admin_users,
        routes::movies::list_movies,
        routes::movies::get_movie,
        routes::movies::create_movie,
        routes::movies::update_movie,
        routes::movies::delete_movie,
        routes::movies::search_movies,
        routes::movies::filter_by_rating,
        routes::movies::filter_by_popularity,
        routes::movies::filter_by_release_year,
        routes::movies::advanced_filter,
        routes::movies::top_by_genre,
        routes::movies::top_of_month,
        routes::movies::upcoming,
        routes::movies::update_box_office,
        routes::movies::movie_details,
        routes::movies::add_award,
        routes::movies::update_award,
        routes::movies::delete_award,
        routes::crew::list_crew,
        routes::crew::get_crew,
        routes::crew::create_crew,
        routes::crew::update_crew,
        routes::crew::delete_crew,
        routes::crew::add_award,
        routes::crew::update_award,
        routes::crew::delete_award,
        routes::reviews::list_reviews,
        routes::reviews::add_review,
        routes::reviews::update_review,
        routes::reviews::delete_review,
        routes::reviews::highlights,
        routes::recommendations::for_user,
        routes::recommendations::similar,
        routes::recommendations::trending,
        routes::recommendations::top_rated,
        routes::lists::create_list,
        routes::lists::get_lists,
        routes::lists::get_list,
        routes::lists::update_list,
        routes::lists::delete_list,
        routes::lists::follow_list,
        routes::lists::unfollow_list,
        routes::discussions::create_discussion,
        routes::discussions::list_discussions,
        routes::discussions::get_discussion,
        routes::discussions::create_reply,
        routes::discussions::like_discussion,
        routes::discussions::dislike_discussion,
        routes::discussions::like_reply,
        routes::discussions::dislike_reply,
        routes::discussions::delete_discussion,
        routes::discussions::delete_reply,
        routes::news::list_news,
        routes::news::get_news,
        routes::news::create_news,
        routes::news::update_news,
        routes::news::delete_news,
        routes::subscriptions::create_subscription,
        routes::subscriptions::list_subscriptions,
        routes::subscriptions::notify_subscribers,
        routes::admin::delete_review,
        routes::admin::statistics,
    ),
    components(schemas(
        ApiErrorBody, routes::MessageResponse,
        RegisterRequest, LoginRequest, routes::auth::RegisteredResponse, routes::auth::LoginResponse,
        PublicUser, ProfileUpdate, UserRating, routes::users::WishlistRequest,
        Movie, NewMovie, MovieUpdate, BoxOffice, BoxOfficeUpdate, Award, NewAward, AwardUpdate,
        routes::movies::BoxOfficeRequest, routes::movies::BoxOfficeResponse, routes::movies::MovieDetails,
        routes::awards::AwardsResponse,
        Crew, NewCrew, CrewUpdate, CrewRole, FilmographyEntry,
        Review, ReviewInput, routes::reviews::ReviewView, routes::reviews::Reviewer, routes::reviews::Highlights,
        MovieList, NewList, ListUpdate, routes::lists::ListView, routes::lists::Creator,
        Discussion, NewDiscussion, DiscussionCategory, Reply, NewReply,
        routes::discussions::DiscussionView, routes::discussions::Author, routes::discussions::DiscussionResponse,
        routes::discussions::CreatedDiscussion, routes::discussions::CreatedReply, routes::discussions::VoteResponse,
        News, NewNews, NewsUpdate, NewsCategory, routes::news::NewsResponse,
        Subscription, NewSubscription, NotificationType,
        routes::subscriptions::CreatedSubscription, routes::subscriptions::SubscriptionView,
        routes::subscriptions::SubscriptionList, routes::subscriptions::NotifyResponse,
        routes::admin::PopularMovie, routes::admin::GenreCount, routes::admin::ActorSearches, routes::admin::RecentUser,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "movies", description = "Movies, crew, reviews and recommendations"),
        (name = "community", description = "Lists, discussions, news and subscriptions"),
        (name = "admin", description = "Moderation and site statistics"),
    )
)]
pub struct ApiDoc;
