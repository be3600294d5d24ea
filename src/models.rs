use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repo::Document;

/// Document identifier. Generated by the application (UUID v4, hyphenated).
pub type Id = String;

pub fn new_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Normalise a client supplied id; `None` when it is not a well-formed id.
pub fn parse_id(raw: &str) -> Option<Id> {
    Uuid::parse_str(raw.trim()).ok().map(|u| u.to_string())
}

/// RFC 3339 timestamps with a fixed nine-digit fraction, so stored values
/// sort the same as strings and as instants. Any RFC 3339 input is accepted.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(d)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------- users

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserRating {
    pub movie: Id,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never exposed through the API (see `PublicUser`)
    pub password: String,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub wishlist: Vec<Id>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub watched_movies: Vec<Id>,
    #[serde(default)]
    pub ratings: Vec<UserRating>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String, is_admin: bool) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            username,
            email,
            password: password_hash,
            favorite_genres: Vec::new(),
            wishlist: Vec::new(),
            is_admin,
            watched_movies: Vec::new(),
            ratings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds `movie` to the wishlist; returns false when it was already there.
    pub fn wish(&mut self, movie: &str) -> bool {
        if self.wishlist.iter().any(|m| m == movie) {
            return false;
        }
        self.wishlist.push(movie.to_string());
        true
    }

    pub fn record_rating(&mut self, movie: &str, rating: u8) {
        match self.ratings.iter_mut().find(|r| r.movie == movie) {
            Some(r) => r.rating = rating,
            None => self.ratings.push(UserRating { movie: movie.to_string(), rating }),
        }
    }

    pub fn forget_rating(&mut self, movie: &str) {
        self.ratings.retain(|r| r.movie != movie);
    }
}

/// User as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Id,
    pub username: String,
    pub email: String,
    pub favorite_genres: Vec<String>,
    pub wishlist: Vec<Id>,
    pub is_admin: bool,
    pub watched_movies: Vec<Id>,
    pub ratings: Vec<UserRating>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            favorite_genres: u.favorite_genres,
            wishlist: u.wishlist,
            is_admin: u.is_admin,
            watched_movies: u.watched_movies,
            ratings: u.ratings,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    /// plain text; hashed before it is stored
    pub password: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
    pub watched_movies: Option<Vec<Id>>,
}

// ---------------------------------------------------------------- awards

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(alias = "name")]
    pub award_name: String,
    pub category: String,
    pub year: i32,
    pub won: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAward {
    #[serde(alias = "name")]
    pub award_name: String,
    pub category: String,
    pub year: i32,
    pub won: bool,
}

impl NewAward {
    pub fn into_award(self) -> Result<Award, ValidationError> {
        require("awardName", &self.award_name)?;
        require("category", &self.category)?;
        Ok(Award {
            id: new_id(),
            award_name: self.award_name,
            category: self.category,
            year: self.year,
            won: self.won,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwardUpdate {
    #[serde(alias = "name")]
    pub award_name: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub won: Option<bool>,
}

impl AwardUpdate {
    pub fn apply(self, award: &mut Award) {
        if let Some(name) = self.award_name.filter(|s| !s.is_empty()) { award.award_name = name; }
        if let Some(category) = self.category.filter(|s| !s.is_empty()) { award.category = category; }
        if let Some(year) = self.year { award.year = year; }
        if let Some(won) = self.won { award.won = won; }
    }
}

/// Documents carrying an embedded award list addressed by award id.
pub trait HasAwards {
    fn awards(&self) -> &[Award];
    fn awards_mut(&mut self) -> &mut Vec<Award>;

    fn update_award(&mut self, award_id: &str, upd: AwardUpdate) -> bool {
        match self.awards_mut().iter_mut().find(|a| a.id == award_id) {
            Some(award) => {
                upd.apply(award);
                true
            }
            None => false,
        }
    }

    fn remove_award(&mut self, award_id: &str) -> Option<Award> {
        let awards = self.awards_mut();
        let idx = awards.iter().position(|a| a.id == award_id)?;
        Some(awards.remove(idx))
    }
}

// ---------------------------------------------------------------- movies

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxOffice {
    #[serde(default)]
    pub opening_weekend: f64,
    #[serde(default)]
    pub domestic: f64,
    #[serde(default)]
    pub international: f64,
    #[serde(default)]
    pub worldwide: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxOfficeUpdate {
    pub opening_weekend: Option<f64>,
    pub domestic: Option<f64>,
    pub international: Option<f64>,
    pub worldwide: Option<f64>,
}

impl BoxOfficeUpdate {
    /// Merge the supplied figures, keeping the ones left out.
    pub fn apply(self, b: &mut BoxOffice) {
        if let Some(v) = self.opening_weekend { b.opening_weekend = v; }
        if let Some(v) = self.domestic { b.domestic = v; }
        if let Some(v) = self.international { b.international = v; }
        if let Some(v) = self.worldwide { b.worldwide = v; }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: Id,
    pub user: Id,
    pub rating: u8,
    pub review_text: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub rating: u8,
    pub review_text: String,
}

impl ReviewInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError("rating must be between 1 and 5".into()));
        }
        require("reviewText", &self.review_text)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ReviewError {
    #[error("User has already reviewed this movie")]
    AlreadyReviewed,
    #[error("Review not found")]
    NotFound,
}

/// Mean of the ratings rounded to one decimal, 0 when there are none.
pub fn calculate_average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
    (total / reviews.len() as f64 * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub genre: Vec<String>,
    pub director: String,
    #[serde(default)]
    pub cast: Vec<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<u32>,
    pub synopsis: Option<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub box_office: BoxOffice,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub cover_photo: Option<String>,
    #[serde(default)]
    pub popularity_score: f64,
    pub country: Option<String>,
    pub language: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub fn refresh_average_rating(&mut self) {
        self.average_rating = calculate_average_rating(&self.reviews);
    }

    pub fn review_by(&self, user: &str) -> Option<&Review> {
        self.reviews.iter().find(|r| r.user == user)
    }

    pub fn add_review(&mut self, user: &str, input: ReviewInput) -> Result<(), ReviewError> {
        if self.review_by(user).is_some() {
            return Err(ReviewError::AlreadyReviewed);
        }
        let now = Utc::now();
        self.reviews.push(Review {
            id: new_id(),
            user: user.to_string(),
            rating: input.rating,
            review_text: input.review_text,
            created_at: now,
            updated_at: now,
        });
        self.refresh_average_rating();
        Ok(())
    }

    pub fn update_review(&mut self, user: &str, input: ReviewInput) -> Result<(), ReviewError> {
        let review = self
            .reviews
            .iter_mut()
            .find(|r| r.user == user)
            .ok_or(ReviewError::NotFound)?;
        review.rating = input.rating;
        review.review_text = input.review_text;
        review.updated_at = Utc::now();
        self.refresh_average_rating();
        Ok(())
    }

    /// Remove the review written by `user`.
    pub fn remove_review_by(&mut self, user: &str) -> Result<Review, ReviewError> {
        let idx = self.reviews.iter().position(|r| r.user == user).ok_or(ReviewError::NotFound)?;
        let removed = self.reviews.remove(idx);
        self.refresh_average_rating();
        Ok(removed)
    }

    /// Remove a review by its own id (moderation).
    pub fn remove_review(&mut self, review_id: &str) -> Result<Review, ReviewError> {
        let idx = self.reviews.iter().position(|r| r.id == review_id).ok_or(ReviewError::NotFound)?;
        let removed = self.reviews.remove(idx);
        self.refresh_average_rating();
        Ok(removed)
    }
}

impl HasAwards for Movie {
    fn awards(&self) -> &[Award] { &self.awards }
    fn awards_mut(&mut self) -> &mut Vec<Award> { &mut self.awards }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub title: String,
    #[serde(default)]
    pub genre: Vec<String>,
    pub director: String,
    #[serde(default)]
    pub cast: Vec<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<u32>,
    pub synopsis: Option<String>,
    pub box_office: Option<BoxOffice>,
    #[serde(default)]
    pub awards: Vec<NewAward>,
    pub cover_photo: Option<String>,
    pub popularity_score: Option<f64>,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl NewMovie {
    pub fn into_movie(self) -> Result<Movie, ValidationError> {
        require("title", &self.title)?;
        require("director", &self.director)?;
        let awards = self
            .awards
            .into_iter()
            .map(NewAward::into_award)
            .collect::<Result<Vec<_>, _>>()?;
        let now = Utc::now();
        Ok(Movie {
            id: new_id(),
            title: self.title,
            genre: self.genre,
            director: self.director,
            cast: self.cast,
            release_date: self.release_date,
            runtime: self.runtime,
            synopsis: self.synopsis,
            average_rating: 0.0,
            box_office: self.box_office.unwrap_or_default(),
            awards,
            reviews: Vec::new(),
            cover_photo: self.cover_photo,
            popularity_score: self.popularity_score.unwrap_or(0.0),
            country: self.country,
            language: self.language,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub genre: Option<Vec<String>>,
    pub director: Option<String>,
    pub cast: Option<Vec<String>>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<u32>,
    pub synopsis: Option<String>,
    pub cover_photo: Option<String>,
    pub popularity_score: Option<f64>,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl MovieUpdate {
    pub fn apply(self, m: &mut Movie) {
        if let Some(v) = self.title { m.title = v; }
        if let Some(v) = self.genre { m.genre = v; }
        if let Some(v) = self.director { m.director = v; }
        if let Some(v) = self.cast { m.cast = v; }
        if let Some(v) = self.release_date { m.release_date = Some(v); }
        if let Some(v) = self.runtime { m.runtime = Some(v); }
        if let Some(v) = self.synopsis { m.synopsis = Some(v); }
        if let Some(v) = self.cover_photo { m.cover_photo = Some(v); }
        if let Some(v) = self.popularity_score { m.popularity_score = v; }
        if let Some(v) = self.country { m.country = Some(v); }
        if let Some(v) = self.language { m.language = Some(v); }
    }
}

// ---------------------------------------------------------------- crew

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum CrewRole {
    Actor,
    Director,
    Crew,
}

impl CrewRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrewRole::Actor => "Actor",
            CrewRole::Director => "Director",
            CrewRole::Crew => "Crew",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FilmographyEntry {
    pub movie: Id,
    pub character: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Crew {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    pub role: CrewRole,
    pub biography: Option<String>,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub filmography: Vec<FilmographyEntry>,
    pub photo: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    #[serde(default)]
    pub notable_works: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl HasAwards for Crew {
    fn awards(&self) -> &[Award] { &self.awards }
    fn awards_mut(&mut self) -> &mut Vec<Award> { &mut self.awards }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCrew {
    pub name: String,
    pub role: CrewRole,
    pub biography: Option<String>,
    #[serde(default)]
    pub awards: Vec<NewAward>,
    #[serde(default)]
    pub filmography: Vec<FilmographyEntry>,
    pub photo: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    #[serde(default)]
    pub notable_works: Vec<String>,
}

impl NewCrew {
    pub fn into_crew(self) -> Result<Crew, ValidationError> {
        require("name", &self.name)?;
        let awards = self
            .awards
            .into_iter()
            .map(NewAward::into_award)
            .collect::<Result<Vec<_>, _>>()?;
        let now = Utc::now();
        Ok(Crew {
            id: new_id(),
            name: self.name,
            role: self.role,
            biography: self.biography,
            awards,
            filmography: self.filmography,
            photo: self.photo,
            birth_date: self.birth_date,
            death_date: self.death_date,
            nationality: self.nationality,
            notable_works: self.notable_works,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrewUpdate {
    pub name: Option<String>,
    pub role: Option<CrewRole>,
    pub biography: Option<String>,
    pub filmography: Option<Vec<FilmographyEntry>>,
    pub photo: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub notable_works: Option<Vec<String>>,
}

impl CrewUpdate {
    pub fn apply(self, c: &mut Crew) {
        if let Some(v) = self.name { c.name = v; }
        if let Some(v) = self.role { c.role = v; }
        if let Some(v) = self.biography { c.biography = Some(v); }
        if let Some(v) = self.filmography { c.filmography = v; }
        if let Some(v) = self.photo { c.photo = Some(v); }
        if let Some(v) = self.birth_date { c.birth_date = Some(v); }
        if let Some(v) = self.death_date { c.death_date = Some(v); }
        if let Some(v) = self.nationality { c.nationality = Some(v); }
        if let Some(v) = self.notable_works { c.notable_works = v; }
    }
}

// ---------------------------------------------------------------- lists

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieList {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub movies: Vec<Id>,
    pub creator: Id,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub followers: Vec<Id>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl MovieList {
    pub fn visible_to(&self, user: Option<&str>) -> bool {
        self.is_public || user == Some(self.creator.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub movies: Vec<Id>,
    #[serde(default)]
    pub is_public: bool,
}

impl NewList {
    pub fn into_list(self, creator: &str) -> Result<MovieList, ValidationError> {
        require("title", &self.title)?;
        let mut movies: Vec<Id> = Vec::with_capacity(self.movies.len());
        for m in self.movies {
            if !movies.contains(&m) {
                movies.push(m);
            }
        }
        let now = Utc::now();
        Ok(MovieList {
            id: new_id(),
            title: self.title,
            description: self.description,
            movies,
            creator: creator.to_string(),
            is_public: self.is_public,
            followers: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub movies: Option<Vec<Id>>,
    pub is_public: Option<bool>,
}

impl ListUpdate {
    pub fn apply(self, l: &mut MovieList) {
        if let Some(v) = self.title { l.title = v; }
        if let Some(v) = self.description { l.description = Some(v); }
        if let Some(v) = self.movies {
            l.movies.clear();
            for m in v {
                if !l.movies.contains(&m) {
                    l.movies.push(m);
                }
            }
        }
        if let Some(v) = self.is_public { l.is_public = v; }
    }
}

// ---------------------------------------------------------------- discussions

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum DiscussionCategory {
    Movies,
    Actors,
    Genres,
    General,
}

impl DiscussionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscussionCategory::Movies => "Movies",
            DiscussionCategory::Actors => "Actors",
            DiscussionCategory::Genres => "Genres",
            DiscussionCategory::General => "General",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

/// Like/dislike sets where each user may sit in at most one of the two.
pub trait Votable {
    fn ballots(&mut self) -> (&mut Vec<Id>, &mut Vec<Id>);

    /// Record `vote` for `user`, dropping an opposite vote. Returns false
    /// when the user had already cast this vote.
    fn vote(&mut self, user: &str, vote: Vote) -> bool {
        let (likes, dislikes) = self.ballots();
        let (chosen, opposite) = match vote {
            Vote::Like => (likes, dislikes),
            Vote::Dislike => (dislikes, likes),
        };
        if chosen.iter().any(|id| id == user) {
            return false;
        }
        chosen.push(user.to_string());
        opposite.retain(|id| id != user);
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    #[serde(rename = "_id")]
    pub id: Id,
    pub category: DiscussionCategory,
    pub title: String,
    pub content: String,
    pub created_by: Id,
    #[serde(default)]
    pub replies: Vec<Id>,
    #[serde(default)]
    pub likes: Vec<Id>,
    #[serde(default)]
    pub dislikes: Vec<Id>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Votable for Discussion {
    fn ballots(&mut self) -> (&mut Vec<Id>, &mut Vec<Id>) {
        (&mut self.likes, &mut self.dislikes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewDiscussion {
    pub category: DiscussionCategory,
    pub title: String,
    pub content: String,
}

impl NewDiscussion {
    pub fn into_discussion(self, author: &str) -> Result<Discussion, ValidationError> {
        require("title", &self.title)?;
        require("content", &self.content)?;
        let now = Utc::now();
        Ok(Discussion {
            id: new_id(),
            category: self.category,
            title: self.title,
            content: self.content,
            created_by: author.to_string(),
            replies: Vec::new(),
            likes: Vec::new(),
            dislikes: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: Id,
    pub discussion: Id,
    pub parent_reply: Option<Id>,
    pub created_by: Id,
    pub content: String,
    #[serde(default)]
    pub likes: Vec<Id>,
    #[serde(default)]
    pub dislikes: Vec<Id>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Votable for Reply {
    fn ballots(&mut self) -> (&mut Vec<Id>, &mut Vec<Id>) {
        (&mut self.likes, &mut self.dislikes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub content: String,
    pub parent_reply: Option<Id>,
}

impl NewReply {
    pub fn into_reply(self, discussion: &str, author: &str) -> Result<Reply, ValidationError> {
        require("content", &self.content)?;
        let now = Utc::now();
        Ok(Reply {
            id: new_id(),
            discussion: discussion.to_string(),
            parent_reply: self.parent_reply,
            created_by: author.to_string(),
            content: self.content,
            likes: Vec::new(),
            dislikes: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

// ---------------------------------------------------------------- news

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum NewsCategory {
    Movies,
    Actors,
    Projects,
    Industry,
}

impl NewsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Movies => "Movies",
            NewsCategory::Actors => "Actors",
            NewsCategory::Projects => "Projects",
            NewsCategory::Industry => "Industry",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct News {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub content: String,
    pub category: NewsCategory,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewNews {
    pub title: String,
    pub content: String,
    pub category: NewsCategory,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: Option<String>,
}

impl NewNews {
    pub fn into_news(self) -> Result<News, ValidationError> {
        require("title", &self.title)?;
        require("content", &self.content)?;
        require("author", &self.author)?;
        let now = Utc::now();
        Ok(News {
            id: new_id(),
            title: self.title,
            content: self.content,
            category: self.category,
            author: self.author,
            tags: self.tags,
            image: self.image,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<NewsCategory>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
}

impl NewsUpdate {
    pub fn apply(self, n: &mut News) {
        if let Some(v) = self.title { n.title = v; }
        if let Some(v) = self.content { n.content = v; }
        if let Some(v) = self.category { n.category = v; }
        if let Some(v) = self.author { n.author = v; }
        if let Some(v) = self.tags { n.tags = v; }
        if let Some(v) = self.image { n.image = Some(v); }
    }
}

// ---------------------------------------------------------------- subscriptions

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Email,
    Dashboard,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: Id,
    pub user: Id,
    pub movie: Option<Id>,
    pub genre: Option<String>,
    #[serde(default)]
    pub notification_type: NotificationType,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    pub movie_id: Option<Id>,
    pub genre: Option<String>,
    pub notification_type: Option<NotificationType>,
}

impl NewSubscription {
    pub fn into_subscription(self, user: &str) -> Result<Subscription, ValidationError> {
        let genre = self.genre.filter(|g| !g.trim().is_empty());
        if self.movie_id.is_none() && genre.is_none() {
            return Err(ValidationError("movieId or genre is required".into()));
        }
        Ok(Subscription {
            id: new_id(),
            user: user.to_string(),
            movie: self.movie_id,
            genre,
            notification_type: self.notification_type.unwrap_or_default(),
            created_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------- search log

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum SearchCategory {
    Actor,
    Movie,
    Genre,
}

impl SearchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCategory::Actor => "Actor",
            SearchCategory::Movie => "Movie",
            SearchCategory::Genre => "Genre",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLog {
    #[serde(rename = "_id")]
    pub id: Id,
    pub user: Option<Id>,
    pub search_query: String,
    pub category: SearchCategory,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl SearchLog {
    pub fn new(search_query: &str, category: SearchCategory, user: Option<Id>) -> Self {
        Self {
            id: new_id(),
            user,
            search_query: search_query.to_string(),
            category,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------- storage hooks

impl Document for User {
    const COLLECTION: &'static str = "users";
    const UNIQUE_FIELDS: &'static [&'static str] = &["username", "email"];
    fn id(&self) -> &str { &self.id }
    fn before_save(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Movie {
    const COLLECTION: &'static str = "movies";
    const TEXT_FIELDS: &'static [&'static str] = &["title", "synopsis"];
    fn id(&self) -> &str { &self.id }
    /// `averageRating` is always derived from the embedded reviews,
    /// whatever value the caller put there.
    fn before_save(&mut self) {
        self.refresh_average_rating();
        self.updated_at = Utc::now();
    }
}

impl Document for Crew {
    const COLLECTION: &'static str = "crew";
    fn id(&self) -> &str { &self.id }
    fn before_save(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for MovieList {
    const COLLECTION: &'static str = "lists";
    fn id(&self) -> &str { &self.id }
    fn before_save(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Discussion {
    const COLLECTION: &'static str = "discussions";
    fn id(&self) -> &str { &self.id }
    fn before_save(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Reply {
    const COLLECTION: &'static str = "replies";
    fn id(&self) -> &str { &self.id }
    fn before_save(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for News {
    const COLLECTION: &'static str = "news";
    fn id(&self) -> &str { &self.id }
    fn before_save(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Subscription {
    const COLLECTION: &'static str = "subscriptions";
    fn id(&self) -> &str { &self.id }
}

impl Document for SearchLog {
    const COLLECTION: &'static str = "searchlogs";
    fn id(&self) -> &str { &self.id }
}
