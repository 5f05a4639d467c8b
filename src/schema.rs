table! {
    epochs (id) {
        id -> Int4,
        number -> Int8,
        start_block -> Int8,
        end_block -> Int8,
        created_at -> Timestamp,
    }
}

table! {
    validator_groups (id) {
        id -> Int4,
        address -> Text,
        name -> Text,
        email -> Text,
        geographic_location -> Text,
        twitter_username -> Text,
        discord_tag -> Text,
        website_url -> Text,
        verified_dns -> Bool,
        epoch_registered_at -> Int8,
        epochs_served -> Int8,
        currently_elected -> Bool,
        locked_celo -> Int8,
        received_votes -> Int8,
        available_votes -> Int8,
        group_share -> Float8,
        group_score -> Float8,
        attestation_score -> Float8,
        slashing_penalty_score -> Float8,
        estimated_apy -> Float8,
        transparency_score -> Float8,
        locked_celo_percentile -> Float8,
        performance_score -> Float8,
        created_at -> Timestamp,
    }
}

table! {
    validators (id) {
        id -> Int4,
        address -> Text,
        name -> Text,
        validator_group_id -> Int4,
        currently_elected -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    validator_group_stats (id) {
        id -> Int4,
        validator_group_id -> Int4,
        epoch_id -> Int4,
        locked_celo -> Int8,
        group_share -> Float8,
        votes -> Int8,
        voting_cap -> Int8,
        attestation_percentage -> Float8,
        slashing_score -> Float8,
        estimated_apy -> Float8,
        created_at -> Timestamp,
    }
}

table! {
    validator_stats (id) {
        id -> Int4,
        validator_id -> Int4,
        epoch_id -> Int4,
        attestations_requested -> Int8,
        attestations_fulfilled -> Int8,
        last_elected -> Int8,
        score -> Float8,
        created_at -> Timestamp,
    }
}

joinable!(validators -> validator_groups (validator_group_id));
joinable!(validator_group_stats -> validator_groups (validator_group_id));
joinable!(validator_group_stats -> epochs (epoch_id));
joinable!(validator_stats -> validators (validator_id));
joinable!(validator_stats -> epochs (epoch_id));

allow_tables_to_appear_in_same_query!(
    epochs,
    validator_groups,
    validators,
    validator_group_stats,
    validator_stats,
);
