//! Portal element catalog.
//!
//! Ids and classes observed on the live FNET portal. Checkout breakage after
//! a portal redesign should be fixable here without touching the flow.

use crate::infrastructure::driver::Target;

// login page
pub const USERNAME_FIELD: Target = Target::css("input[name='mv_username']", "username field");
pub const PASSWORD_FIELD: Target = Target::css("input[name='mv_password']", "password field");
pub const LOGIN_BUTTON: Target = Target::css(".login", "login button");
pub const WELCOME_BANNER: Target = Target::css("div.welcome span[role='heading']", "welcome banner");

// catalog search / product page
pub const SEARCH_INPUT: Target = Target::css("#searchInput", "catalog search input");
pub const PRODUCT_TITLE: Target = Target::css("#brandTitle", "product detail title");
pub const QUANTITY_FIELD: Target = Target::css("#quantBox", "quantity field");
pub const ADD_TO_BAG: Target = Target::css("#addBagButton", "add to bag button");

// checkout: shipping
pub const SHIPPING_FORM: Target = Target::css("#shippingFields", "shipping form");
pub const FIRST_NAME: Target = Target::css("#fname", "first name field");
pub const LAST_NAME: Target = Target::css("#lname", "last name field");
pub const ADDRESS1: Target = Target::css("#address1", "address line 1");
pub const ADDRESS2: Target = Target::css("#address2", "address line 2");
pub const ZIP: Target = Target::css("#zip", "zip field");
pub const CITY: Target = Target::css("#city", "city field");
pub const STATE_DROPDOWN: Target = Target::css("#ship_state_drop", "state dropdown");
pub const SHIPPING_PROCEED: Target = Target::css("#shippingProceedButton", "shipping continue button");
// The dropship radio sits under an overlay; only its programmatic click works.
pub const DROPSHIP_METHOD: Target = Target::css("#DSP", "dropship shipping method");
pub const PROCEED_CHECKOUT: Target = Target::css("#proceedCheckButton", "continue to payment button");

// checkout: payment
// The three card fields live in isolated same-origin frames, one field each.
pub const PAYMENT_FRAME: Target = Target::css("iframe.js-iframe", "payment frame");
pub const CARD_NUMBER_FIELD: Target = Target::css("#encryptedCardNumber", "card number field");
pub const CARD_EXPIRY_FIELD: Target = Target::css("#encryptedExpiryDate", "card expiry field");
pub const CARD_CVV_FIELD: Target = Target::css("#encryptedSecurityCode", "card security code field");
pub const SUBMIT_ORDER: Target = Target::css("#submitOrder", "submit order button");
pub const CONFIRMATION_HEADING: Target = Target::css("h2.panel-title", "order confirmation heading");
