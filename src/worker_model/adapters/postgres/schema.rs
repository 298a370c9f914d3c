//! Diesel schema for worker model persistence and coordination.

diesel::table! {
    /// Worker model records.
    worker_models (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Unique model name.
        #[max_length = 100]
        name -> Varchar,
        /// Owning group.
        group_id -> Int8,
        /// Provisioning technology.
        #[max_length = 50]
        model_type -> Varchar,
        /// Image reference.
        image -> Text,
        /// Free-form description.
        description -> Text,
        /// Provider-specific template.
        template -> Nullable<Text>,
        /// Worker communication channel.
        #[max_length = 20]
        communication -> Varchar,
        /// Worker boot script.
        run_script -> Text,
        /// Number of pre-provisioned workers.
        provision -> Int8,
        /// Restricted to the owning group's hatcheries.
        restricted -> Bool,
        /// Disabled flag.
        disabled -> Bool,
        /// Deprecated flag.
        is_deprecated -> Bool,
        /// Registry access as JSONB.
        registry -> Jsonb,
        /// Worker environment variables as JSONB.
        envs -> Jsonb,
        /// Encrypted registry password token.
        password -> Nullable<Text>,
        /// Registration required before use.
        need_registration -> Bool,
        /// Last registration completion time.
        last_registration -> Nullable<Timestamptz>,
        /// Registered operating system.
        #[max_length = 50]
        registered_os -> Nullable<Varchar>,
        /// Registered architecture.
        #[max_length = 50]
        registered_arch -> Nullable<Varchar>,
        /// Recheck epoch stamped by the last registration.
        registered_epoch -> Int8,
        /// Spawn failures since the last update or registration.
        nb_spawn_err -> Int4,
        /// Last spawn failure message.
        last_spawn_err -> Nullable<Text>,
        /// Last spawn failure logs.
        last_spawn_err_logs -> Nullable<Bytea>,
        /// Last spawn failure time.
        date_last_spawn_err -> Nullable<Timestamptz>,
        /// Last user modification time.
        user_last_modified -> Timestamptz,
    }
}

diesel::table! {
    /// Capabilities discovered by worker model registration.
    worker_capabilities (worker_model_id, name) {
        /// Owning worker model.
        worker_model_id -> Int8,
        /// Capability name.
        #[max_length = 255]
        name -> Varchar,
        /// Capability type (binary, os-arch, ...).
        #[max_length = 50]
        capability_type -> Varchar,
        /// Capability value.
        argument -> Text,
    }
}

diesel::table! {
    /// Shared coordination entries (bookings, cached listings, counters).
    coordination_entries (key) {
        /// Entry key.
        #[max_length = 255]
        key -> Varchar,
        /// Opaque entry value.
        value -> Text,
        /// Expiry deadline; `NULL` never expires.
        expires_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(worker_capabilities -> worker_models (worker_model_id));
diesel::allow_tables_to_appear_in_same_query!(worker_models, worker_capabilities);
