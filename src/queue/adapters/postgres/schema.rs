//! Diesel schema for generation task persistence.

diesel::table! {
    /// Generation task backlog.
    generation_tasks (id) {
        /// Task identifier.
        id -> Int8,
        /// Task lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Attempt counter.
        retry_count -> Int4,
        /// Last failure reason.
        error_message -> Nullable<Text>,
        /// Timestamp of the latest claim.
        generation_started_at -> Nullable<Timestamptz>,
        /// Instruction built for the latest attempt.
        generation_prompt -> Nullable<Text>,
        /// Public reference of the produced artifact.
        result_reference -> Nullable<Text>,
        /// Whether the artifact was produced.
        artifact_generated -> Bool,
        /// Human-readable task name.
        name -> Nullable<Text>,
        /// Task category.
        category -> Nullable<Text>,
        /// Contextual attributes.
        attributes -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
