// Mirrors crates/infra/migrations. Regenerate with `diesel print-schema` after a schema change.

diesel::table! {
    linkedin_posts (id) {
        id -> Uuid,
        user_id -> Uuid,
        post_urn -> Text,
        posted_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    linkedin_tokens (user_id) {
        user_id -> Uuid,
        access_token -> Text,
        refresh_token -> Nullable<Text>,
        expires_at -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    oauth_states (state) {
        state -> Text,
        user_id -> Uuid,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        stripe_payment_intent_id -> Text,
        stripe_customer_id -> Nullable<Text>,
        customer_email -> Text,
        customer_name -> Nullable<Text>,
        amount_total -> Numeric,
        amount_subtotal -> Numeric,
        currency -> Text,
        payment_status -> Text,
        product_id -> Text,
        product_name -> Text,
        payment_method -> Nullable<Text>,
        metadata -> Jsonb,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    linkedin_posts,
    linkedin_tokens,
    oauth_states,
    payments,
);
