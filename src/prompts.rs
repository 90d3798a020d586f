//! System prompt for the structuring call.
//!
//! Kept in one place so the field list the model is asked for can be checked
//! against [`crate::output::StructuredProduct`] in tests. Callers can replace
//! it via [`crate::config::ExtractionConfig::system_prompt`].

/// Fields the model is asked to fill, in prompt order.
pub const PRODUCT_FIELDS: [&str; 14] = [
    "product_name",
    "brand",
    "price",
    "materials",
    "finish_options",
    "dimensions",
    "bulb_info",
    "features",
    "assembly",
    "care",
    "delivery",
    "related_products",
    "reviews",
    "product_url",
];

/// Default system prompt for turning product text into a JSON record.
pub const PRODUCT_EXTRACTION_PROMPT: &str = r#"You are a product data extractor AI. Given product information from a PDF or website, extract structured product details in this JSON format:

{
  "product_name": "",
  "brand": "",
  "price": "",
  "materials": "",
  "finish_options": [],
  "dimensions": {},
  "bulb_info": {},
  "features": [],
  "assembly": "",
  "care": "",
  "delivery": {},
  "related_products": [],
  "reviews": [],
  "product_url": ""
}

Fill out all the fields as best you can. If data is missing, leave the field empty. Do not invent values that are not present in the text.
Output ONLY the JSON object, with no commentary and no markdown fences."#;
