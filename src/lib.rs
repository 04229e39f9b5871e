pub mod data {
    pub mod datasources {
        pub mod billing_service_datasource;
        pub mod test_store_datasource;
        pub(crate) mod utils;
    }
    pub mod models {
        pub(crate) mod app_store {
            pub(crate) mod jws_transaction_decoded_payload_model;
        }
        pub mod billing_service {
            pub mod billing_result_model;
            pub mod product_details_model;
            pub mod purchase_model;
            pub mod storefront_model;
        }
    }
    pub mod repositories {
        pub mod in_app_billing_impl;
        pub mod jws_purchase_verifier;
    }
}

pub mod domain {
    pub mod entities {
        pub mod billing_platform;
        pub mod finalize_result;
        pub mod in_app_billing_product;
        pub mod in_app_billing_purchase;
        pub mod item_type;
        pub mod storefront;
    }
    pub mod repositories {
        pub mod in_app_billing;
        pub mod purchase_verifier;
    }
}

pub mod config;
pub mod errors;
pub mod util;
