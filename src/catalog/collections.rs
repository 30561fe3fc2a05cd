use super::{
    CollectionDeclaration, CollectionSpec, Field, IndexSpec, TypeTag,
    ValidationSchema,
};

use super::TypeTag::{Array, Bool, Date, Int, Long, Null, Object, ObjectId};

const STRING: &[TypeTag] = &[TypeTag::String];
const NULLABLE_STRING: &[TypeTag] = &[TypeTag::String, Null];
const DATE: &[TypeTag] = &[Date];
const NULLABLE_DATE: &[TypeTag] = &[Date, Null];
const OBJECT_ID: &[TypeTag] = &[ObjectId];
const NULLABLE_OBJECT_ID: &[TypeTag] = &[ObjectId, Null];
const INTEGER: &[TypeTag] = &[Int, Long];
const NULLABLE_INTEGER: &[TypeTag] = &[Int, Long, Null];
const OBJECT: &[TypeTag] = &[Object];
const ARRAY: &[TypeTag] = &[Array];

pub const USERS: &str = "users";
pub const TOKENS: &str = "tokens";
pub const POSTS: &str = "posts";
pub const LIKES: &str = "likes";
pub const ACHIEVEMENTS: &str = "achievements";
pub const USER_ACHIEVEMENTS: &str = "user_achievements";
pub const CARS: &str = "cars";
pub const FOLLOWS: &str = "follows";
pub const TURBODEX: &str = "turbodex";
pub const AUDIT_LOGS: &str = "audit_logs";

pub const POST_STATUSES: &[&str] = &["pending", "processed", "rejected"];
pub const RANKING_PERIODS: &[&str] = &["daily", "weekly", "monthly", "all"];

fn declare(
    name: &'static str,
    required: Vec<&'static str>,
    fields: Vec<Field>,
    indexes: Vec<IndexSpec>,
) -> CollectionDeclaration {
    CollectionDeclaration {
        spec: CollectionSpec {
            name,
            validation: Some(ValidationSchema { required, fields }),
        },
        indexes,
    }
}

fn users() -> CollectionDeclaration {
    declare(
        USERS,
        vec!["username", "username_ci", "password_hash", "created_at"],
        vec![
            Field::typed("username", STRING),
            // lowercased username, backs case-insensitive uniqueness
            Field::typed("username_ci", STRING),
            Field::typed("email", NULLABLE_STRING),
            Field::typed("password_hash", STRING),
            Field::typed("roles", ARRAY),
            Field::typed("profile", OBJECT),
            Field::typed("stats", OBJECT),
            Field::typed("created_at", DATE),
            Field::typed("updated_at", NULLABLE_DATE),
            Field::typed("last_login_at", NULLABLE_DATE),
        ],
        vec![
            IndexSpec::new(USERS, "username_ci_1")
                .asc("username_ci")
                .unique(),
            IndexSpec::new(USERS, "email_1").asc("email").sparse(),
            IndexSpec::new(USERS, "points_desc").desc("stats.points"),
        ],
    )
}

/// Refresh sessions. Rows disappear once `expires_at` passes.
fn tokens() -> CollectionDeclaration {
    declare(
        TOKENS,
        vec!["user_id", "token_hash", "created_at", "expires_at"],
        vec![
            Field::typed("user_id", OBJECT_ID),
            Field::typed("token_hash", STRING),
            Field::typed("revoked", &[Bool, Null]),
            Field::typed("created_at", DATE),
            Field::typed("expires_at", DATE),
        ],
        vec![
            IndexSpec::new(TOKENS, "token_hash_1")
                .asc("token_hash")
                .unique(),
            IndexSpec::new(TOKENS, "token_user_1").asc("user_id"),
            IndexSpec::new(TOKENS, "ttl_by_expires")
                .asc("expires_at")
                .expire_after_seconds(0),
        ],
    )
}

fn posts() -> CollectionDeclaration {
    declare(
        POSTS,
        vec!["user_id", "blob_name", "status", "created_at"],
        vec![
            Field::typed("user_id", OBJECT_ID),
            // raw upload container
            Field::typed("blob_name", STRING),
            // processed container
            Field::typed("processed_blob_url", NULLABLE_STRING),
            Field::one_of("status", POST_STATUSES),
            Field::typed("taken_at", NULLABLE_DATE),
            Field::typed("created_at", DATE),
            Field::typed("rejected_reason", NULLABLE_STRING),
            // {city, country, lat, lon}
            Field::typed("location", OBJECT),
            Field::object(
                "vehicle",
                vec![
                    Field::typed("vehicle_id", NULLABLE_OBJECT_ID),
                    Field::typed("brand", NULLABLE_STRING),
                    Field::typed("model", NULLABLE_STRING),
                    Field::typed("body_type", NULLABLE_STRING),
                    Field::typed("engine_type", NULLABLE_STRING),
                    Field::typed("plate", NULLABLE_STRING),
                    // Common, Rare, Epic, Legendary
                    Field::typed("rarity", NULLABLE_STRING),
                ],
            ),
            Field::typed("like_count", NULLABLE_INTEGER),
            Field::typed("comment_count", NULLABLE_INTEGER),
        ],
        vec![
            IndexSpec::new(POSTS, "user_created")
                .asc("user_id")
                .desc("created_at"),
            IndexSpec::new(POSTS, "created_desc").desc("created_at"),
            IndexSpec::new(POSTS, "status_created")
                .asc("status")
                .desc("created_at"),
            IndexSpec::new(POSTS, "vehicle_brand_model")
                .asc("vehicle.brand")
                .asc("vehicle.model"),
            IndexSpec::new(POSTS, "vehicle_plate_1")
                .asc("vehicle.plate")
                .sparse(),
            // feed pagination: newest first, _id breaks timestamp ties
            IndexSpec::new(POSTS, "post_feed_idx")
                .desc("created_at")
                .desc("_id"),
        ],
    )
}

fn likes() -> CollectionDeclaration {
    declare(
        LIKES,
        vec!["user_id", "post_id", "created_at"],
        vec![
            Field::typed("user_id", OBJECT_ID),
            Field::typed("post_id", OBJECT_ID),
            Field::typed("created_at", DATE),
        ],
        vec![
            IndexSpec::new(LIKES, "likes_by_post").asc("post_id"),
            IndexSpec::new(LIKES, "likes_by_user").asc("user_id"),
            IndexSpec::new(LIKES, "user_post_unique")
                .asc("user_id")
                .asc("post_id")
                .unique(),
        ],
    )
}

fn achievements() -> CollectionDeclaration {
    declare(
        ACHIEVEMENTS,
        vec!["key", "title", "points"],
        vec![
            Field::typed("key", STRING),
            Field::typed("title", STRING),
            Field::typed("description", NULLABLE_STRING),
            Field::typed("icon", NULLABLE_STRING),
            Field::typed("points", INTEGER),
        ],
        vec![IndexSpec::new(ACHIEVEMENTS, "key_1").asc("key").unique()],
    )
}

fn user_achievements() -> CollectionDeclaration {
    declare(
        USER_ACHIEVEMENTS,
        vec!["user_id", "achievement_key", "unlocked_at"],
        vec![
            Field::typed("user_id", OBJECT_ID),
            Field::typed("achievement_key", STRING),
            Field::typed("unlocked_at", DATE),
        ],
        vec![
            IndexSpec::new(USER_ACHIEVEMENTS, "ua_by_user").asc("user_id"),
            IndexSpec::new(USER_ACHIEVEMENTS, "ua_by_key")
                .asc("achievement_key"),
            IndexSpec::new(USER_ACHIEVEMENTS, "ua_unique")
                .asc("user_id")
                .asc("achievement_key")
                .unique(),
        ],
    )
}

/// Reference list of car models.
fn cars() -> CollectionDeclaration {
    declare(
        CARS,
        vec!["brand", "model"],
        vec![
            Field::typed("brand", STRING),
            Field::typed("model", STRING),
            Field::typed("body_type", NULLABLE_STRING),
            Field::typed("engine_type", NULLABLE_STRING),
            Field::typed("year_from", &[Int, Null]),
            Field::typed("year_to", &[Int, Null]),
            Field::typed("tags", ARRAY),
        ],
        vec![
            IndexSpec::new(CARS, "brand_model_body")
                .asc("brand")
                .asc("model")
                .asc("body_type"),
            IndexSpec::new(CARS, "model_1").asc("model"),
        ],
    )
}

fn follows() -> CollectionDeclaration {
    declare(
        FOLLOWS,
        vec!["follower_id", "followee_id", "created_at"],
        vec![
            Field::typed("follower_id", OBJECT_ID),
            Field::typed("followee_id", OBJECT_ID),
            Field::typed("created_at", DATE),
        ],
        vec![
            IndexSpec::new(FOLLOWS, "by_follower").asc("follower_id"),
            IndexSpec::new(FOLLOWS, "by_followee").asc("followee_id"),
            IndexSpec::new(FOLLOWS, "follow_unique")
                .asc("follower_id")
                .asc("followee_id")
                .unique(),
        ],
    )
}

/// Per-period leaderboard rows.
fn turbodex() -> CollectionDeclaration {
    declare(
        TURBODEX,
        vec!["user_id", "period", "points", "updated_at"],
        vec![
            Field::typed("user_id", OBJECT_ID),
            Field::one_of("period", RANKING_PERIODS),
            Field::typed("points", INTEGER),
            Field::typed("rank", NULLABLE_INTEGER),
            Field::typed("updated_at", DATE),
        ],
        vec![
            IndexSpec::new(TURBODEX, "period_points_desc")
                .asc("period")
                .desc("points"),
            IndexSpec::new(TURBODEX, "user_period_unique")
                .asc("user_id")
                .asc("period")
                .unique(),
        ],
    )
}

fn audit_logs() -> CollectionDeclaration {
    declare(
        AUDIT_LOGS,
        vec!["ts", "actor", "action"],
        vec![
            Field::typed("ts", DATE),
            Field::typed("actor", NULLABLE_OBJECT_ID),
            Field::typed("action", STRING),
            Field::typed("meta", OBJECT),
        ],
        vec![IndexSpec::new(AUDIT_LOGS, "ts_desc").desc("ts")],
    )
}

/// Every collection in provisioning order.
pub fn declarations() -> Vec<CollectionDeclaration> {
    vec![
        users(),
        tokens(),
        posts(),
        likes(),
        achievements(),
        user_achievements(),
        cars(),
        follows(),
        turbodex(),
        audit_logs(),
    ]
}
