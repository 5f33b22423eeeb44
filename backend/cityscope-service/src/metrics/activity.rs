use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    /// Posts created, segmented by whether an image was attached.
    pub static ref POSTS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cityscope_posts_created_total",
        "Posts created segmented by image presence",
        &["with_image"]
    )
    .expect("failed to register cityscope_posts_created_total");

    /// Like/dislike toggles (action=like|dislike, outcome=added|cleared|switched).
    pub static ref REACTION_TOGGLES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cityscope_reaction_toggles_total",
        "Reaction toggles segmented by action and resulting transition",
        &["action", "outcome"]
    )
    .expect("failed to register cityscope_reaction_toggles_total");

    pub static ref REPLIES_CREATED_TOTAL: IntCounter = register_int_counter!(
        "cityscope_replies_created_total",
        "Replies created"
    )
    .expect("failed to register cityscope_replies_created_total");

    /// Blob store uploads (success/error).
    pub static ref IMAGE_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cityscope_image_uploads_total",
        "Image uploads segmented by result",
        &["result"]
    )
    .expect("failed to register cityscope_image_uploads_total");
}
