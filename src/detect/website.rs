use serde::{Deserialize, Serialize};

use crate::detect::field_model::DetectedForm;

/// Coarse classification of the page hosting the forms, used to bias
/// matching and rephrasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteType {
    JobPortal,
    Ecommerce,
    Social,
    Rental,
    Government,
    Finance,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormIntent {
    JobApplication,
    Registration,
    Login,
    Checkout,
    Contact,
    Survey,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteContext {
    pub site_type: SiteType,
    pub form_intent: FormIntent,
    pub page_title: String,
}

/// Classify the page from URL, title and form shape keywords.
pub fn classify_website(url: Option<&str>, title: &str, forms: &[DetectedForm]) -> WebsiteContext {
    let haystack = format!("{} {}", url.unwrap_or(""), title).to_lowercase();

    let site_type = if contains_any(&haystack, &["job", "career", "greenhouse", "lever", "workday", "recruit"]) {
        SiteType::JobPortal
    } else if contains_any(&haystack, &["shop", "cart", "store", "checkout"]) {
        SiteType::Ecommerce
    } else if contains_any(&haystack, &["rental", "apartment", "housing", "lease", "zillow"]) {
        SiteType::Rental
    } else if contains_any(&haystack, &[".gov", "visa", "passport", "tax"]) {
        SiteType::Government
    } else if contains_any(&haystack, &["bank", "loan", "insurance", "credit"]) {
        SiteType::Finance
    } else if contains_any(&haystack, &["social", "profile", "community", "forum"]) {
        SiteType::Social
    } else {
        SiteType::Other
    };

    WebsiteContext {
        site_type,
        form_intent: infer_form_intent(&haystack, forms),
        page_title: title.to_string(),
    }
}

fn infer_form_intent(haystack: &str, forms: &[DetectedForm]) -> FormIntent {
    let has_password = forms.iter().any(|f| {
        f.fields.iter().any(|field| {
            field
                .metadata
                .input_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("password"))
        })
    });
    let field_count: usize = forms.iter().map(|f| f.fields.len()).sum();

    if contains_any(haystack, &["apply", "application", "job", "career"]) {
        return FormIntent::JobApplication;
    }
    if contains_any(haystack, &["register", "sign up", "signup", "create account"]) {
        return FormIntent::Registration;
    }
    if has_password && field_count <= 3 {
        return FormIntent::Login;
    }
    if has_password {
        return FormIntent::Registration;
    }
    if contains_any(haystack, &["checkout", "payment", "billing"]) {
        return FormIntent::Checkout;
    }
    if contains_any(haystack, &["contact", "support", "feedback"]) {
        return FormIntent::Contact;
    }
    if contains_any(haystack, &["survey", "questionnaire"]) {
        return FormIntent::Survey;
    }

    FormIntent::Other
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
