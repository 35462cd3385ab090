use model::{
    core::value::Value,
    spec::{
        rule::{DefaultValue, NestedAssetFields, TransformRule},
        table::{ColumnSpec, TableRef, TableSpec, WriteMode},
    },
};

/// Built-in specs in dependency order: users before anything that
/// references them, shops before products.
pub fn specs() -> Vec<TableSpec> {
    vec![users(), user_profiles(), artisan_shops(), products(), user_roles()]
}

pub fn users() -> TableSpec {
    TableSpec::new("users", TableRef::new("auth", "users"), TableRef::new("auth", "users"))
        .describe("Migrate users from auth.users to auth.users")
        .primary_key(&["id"])
        .sort_by("created_at")
        .passthrough(&[
            "instance_id",
            "id",
            "aud",
            "role",
            "email",
            "encrypted_password",
            "email_confirmed_at",
            "invited_at",
            "confirmation_token",
            "confirmation_sent_at",
            "recovery_token",
            "recovery_sent_at",
            "email_change_token_new",
            "email_change",
            "email_change_sent_at",
            "last_sign_in_at",
            "raw_app_meta_data",
            "raw_user_meta_data",
            "is_super_admin",
            "created_at",
            "updated_at",
            "phone",
            "phone_confirmed_at",
            "phone_change",
            "phone_change_token",
            "phone_change_sent_at",
            "email_change_token_current",
            "email_change_confirm_status",
            "banned_until",
            "reauthentication_token",
            "reauthentication_sent_at",
            "is_sso_user",
            "deleted_at",
            "is_anonymous",
        ])
        .preserve(&["created_at"])
        .label(&["email", "id"])
}

pub fn user_profiles() -> TableSpec {
    TableSpec::new(
        "user_profiles",
        TableRef::new("public", "user_profiles"),
        TableRef::new("artesanos", "user_profiles"),
    )
    .describe("Migrate profiles from public.user_profiles to artesanos.user_profiles")
    .primary_key(&["id"])
    .sort_by("created_at")
    .passthrough(&[
        "id",
        "user_id",
        "full_name",
        "avatar_url",
        "created_at",
        "updated_at",
        "business_description",
        "brand_name",
        "business_type",
        "target_market",
        "current_stage",
        "business_goals",
        "monthly_revenue_goal",
        "time_availability",
        "team_size",
        "current_challenges",
        "sales_channels",
        "social_media_presence",
        "business_location",
        "years_in_business",
        "initial_investment_range",
        "primary_skills",
        "language_preference",
        "user_type",
        "first_name",
        "last_name",
        "whatsapp_e164",
        "department",
        "city",
        "rut",
        "rut_pendiente",
        "newsletter_opt_in",
        "account_type",
        "dane_city",
    ])
    .with_rule(&["avatar_url"], TransformRule::asset_url("/images/"))
    .preserve(&["created_at"])
    .label(&["user_id", "id"])
}

const SHOP_JSON_COLUMNS: &[&str] = &[
    "certifications",
    "contact_info",
    "social_links",
    "seo_data",
    "data_classification",
    "public_profile",
    "primary_colors",
    "secondary_colors",
    "hero_config",
    "about_content",
    "contact_config",
    "artisan_profile",
];

fn shop_nested_assets() -> TransformRule {
    TransformRule::NestedAssets(
        NestedAssetFields::new("/")
            .object_list("slides", "imageUrl")
            .single("artisanPhoto")
            .array("familyPhotos")
            .array("workingPhotos")
            .array("workshopPhotos")
            .array("communityPhotos"),
    )
}

pub fn artisan_shops() -> TableSpec {
    TableSpec::new(
        "artisan_shops",
        TableRef::new("public", "artisan_shops"),
        TableRef::new("shop", "artisan_shops"),
    )
    .describe("Migrate shops from public.artisan_shops to shop.artisan_shops")
    .primary_key(&["id"])
    .sort_by("created_at")
    .passthrough(&[
        "id",
        "user_id",
        "shop_name",
        "shop_slug",
        "description",
        "story",
        "logo_url",
        "banner_url",
        "craft_type",
        "region",
        "certifications",
        "contact_info",
        "social_links",
        "active",
        "featured",
        "seo_data",
        "created_at",
        "updated_at",
        "privacy_level",
        "data_classification",
        "public_profile",
        "creation_status",
        "creation_step",
        "primary_colors",
        "secondary_colors",
        "brand_claim",
        "hero_config",
        "about_content",
        "contact_config",
        "active_theme_id",
        "publish_status",
        "marketplace_approved",
        "marketplace_approved_at",
        "marketplace_approved_by",
        "id_contraparty",
        "artisan_profile",
        "artisan_profile_completed",
        "bank_data_status",
        "marketplace_approval_status",
        "department",
        "municipality",
    ])
    .column(ColumnSpec::default_value(
        "servientrega_coverage",
        DefaultValue::Constant(Value::Boolean(false)),
    ))
    .with_rule(SHOP_JSON_COLUMNS, TransformRule::JsonSanitize)
    .with_rule(&["hero_config", "artisan_profile"], shop_nested_assets())
    .with_rule(&["logo_url", "banner_url"], TransformRule::asset_url("/"))
    .with_rule(
        &["bank_data_status"],
        TransformRule::enum_remap(
            &[("pending", "complete"), ("approved", "complete")],
            Some("not_set"),
        ),
    )
    .preserve(&["created_at"])
    .label(&["shop_name", "id"])
}

const PRODUCT_JSON_COLUMNS: &[&str] = &[
    "images",
    "tags",
    "dimensions",
    "materials",
    "techniques",
    "seo_data",
    "marketplace_links",
];

pub fn products() -> TableSpec {
    TableSpec::new(
        "products",
        TableRef::new("public", "products"),
        TableRef::new("shop", "products"),
    )
    .describe("Migrate products from public.products to shop.products")
    .primary_key(&["id"])
    .sort_by("created_at")
    .passthrough(&[
        "id",
        "shop_id",
        "name",
        "description",
        "short_description",
        "price",
        "compare_price",
        "images",
        "category",
        "subcategory",
        "tags",
        "inventory",
        "sku",
        "weight",
        "dimensions",
        "materials",
        "techniques",
        "production_time",
        "customizable",
        "active",
        "featured",
        "seo_data",
        "created_at",
        "updated_at",
        "category_id",
        "made_to_order",
        "lead_time_days",
        "production_time_hours",
        "requires_customization",
        "marketplace_links",
        "embedding",
        "moderation_status",
        "shipping_data_complete",
        "ready_for_checkout",
        "allows_local_pickup",
    ])
    .with_rule(PRODUCT_JSON_COLUMNS, TransformRule::JsonSanitize)
    .with_rule(
        &["images"],
        TransformRule::NestedAssets(NestedAssetFields::new("/")),
    )
    .preserve(&["created_at"])
    .label(&["name", "id"])
}

pub fn user_roles() -> TableSpec {
    TableSpec::new(
        "user_roles",
        TableRef::new("public", "user_roles"),
        TableRef::new("auth", "user_roles"),
    )
    .describe("Migrate roles from public.user_roles to auth.user_roles")
    .primary_key(&["id"])
    .sort_by("created_at")
    .passthrough(&["id", "user_id", "role", "created_at"])
    .mode(WriteMode::SkipExisting)
    .label(&["user_id", "id"])
}
