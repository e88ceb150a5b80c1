//! Localization utilities used by diagnostics and data type hints.
//!
//! Two kinds of text are localized. Diagnostics (parse errors, coercion
//! failures, state misuse) follow the globally selected language, which a test
//! may override per thread with [`ScopedLocalization`]. Data type hints follow
//! the language of the document being executed and are rendered through
//! [`message_in`], which keeps one loader per requested language.

use std::cell::RefCell;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use fluent::FluentArgs;
use hashbrown::HashMap;
use i18n_embed::I18nEmbedError;
use i18n_embed::fluent::{FluentLanguageLoader, fluent_language_loader};
use rust_embed::RustEmbed;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

/// Embedded Fluent resources shipped with the crate.
///
/// # Examples
/// ```
/// # use kumo::localization::Localizations;
/// # use i18n_embed::fluent::fluent_language_loader;
/// # use unic_langid::langid;
/// let loader = fluent_language_loader!();
/// let selected = i18n_embed::select(&loader, &Localizations, &[langid!("es-ES")])
///     .expect("bundled locale loads");
/// assert!(selected.contains(&langid!("es-ES")));
/// ```
#[derive(RustEmbed)]
#[folder = "i18n"]
pub struct Localizations;

fn load(requested: &[LanguageIdentifier]) -> Result<FluentLanguageLoader, I18nEmbedError> {
    let loader = fluent_language_loader!();
    i18n_embed::select(&loader, &Localizations, requested)?;
    Ok(loader)
}

fn english() -> FluentLanguageLoader {
    load(&[unic_langid::langid!("en-US")])
        .unwrap_or_else(|error| panic!("failed to load default English translations: {error}"))
}

static LANGUAGE_LOADER: LazyLock<RwLock<FluentLanguageLoader>> =
    LazyLock::new(|| RwLock::new(english()));

static DOCUMENT_LOADERS: LazyLock<RwLock<HashMap<String, Arc<FluentLanguageLoader>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

thread_local! {
    static OVERRIDE_LOADER: RefCell<Option<FluentLanguageLoader>> = const { RefCell::new(None) };
}

/// Errors from localization setup and queries.
#[derive(Debug, Error)]
pub enum LocalizationError {
    /// Global or thread-local localization state was poisoned.
    #[error("localization state is poisoned")]
    Poisoned,
    /// Loading or selecting Fluent resources failed.
    #[error("failed to load localization resources: {0}")]
    Loader(#[from] I18nEmbedError),
}

/// RAII guard that installs a thread-local localization loader for the
/// lifetime of the guard.
#[must_use]
pub struct ScopedLocalization {
    previous: Option<FluentLanguageLoader>,
}

impl ScopedLocalization {
    /// Load the requested locales into a dedicated loader and make it the
    /// active loader for the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`LocalizationError::Loader`] if localization resources cannot
    /// be loaded for the requested languages.
    pub fn new(requested: &[LanguageIdentifier]) -> Result<Self, LocalizationError> {
        let loader = load(requested)?;
        let previous = OVERRIDE_LOADER.with(|cell| cell.replace(Some(loader)));
        Ok(Self { previous })
    }
}

impl Drop for ScopedLocalization {
    fn drop(&mut self) {
        let previous = self.previous.take();
        OVERRIDE_LOADER.with(|cell| {
            *cell.borrow_mut() = previous;
        });
    }
}

/// Activate the best matching localizations for the provided language
/// identifiers, process wide.
///
/// # Errors
///
/// Returns [`LocalizationError::Poisoned`] if the global loader lock is poisoned
/// or [`LocalizationError::Loader`] when resource selection fails.
pub fn select_localizations(
    requested: &[LanguageIdentifier],
) -> Result<Vec<LanguageIdentifier>, LocalizationError> {
    let guard = LANGUAGE_LOADER
        .read()
        .map_err(|_| LocalizationError::Poisoned)?;
    Ok(i18n_embed::select(&*guard, &Localizations, requested)?)
}

/// Query the currently active diagnostic languages.
///
/// # Errors
///
/// Returns [`LocalizationError::Poisoned`] if the loader lock is poisoned.
pub fn current_languages() -> Result<Vec<LanguageIdentifier>, LocalizationError> {
    OVERRIDE_LOADER.with(|cell| -> Result<_, LocalizationError> {
        if let Some(loader) = cell.borrow().as_ref() {
            return Ok(loader.current_languages());
        }
        let guard = LANGUAGE_LOADER
            .read()
            .map_err(|_| LocalizationError::Poisoned)?;
        Ok(guard.current_languages())
    })
}

/// Retrieve a localised diagnostic without interpolation arguments.
///
/// # Examples
/// ```
/// # use kumo::localization;
/// assert_eq!(localization::message("result-passed"), "passed");
/// ```
#[must_use]
pub fn message(id: &str) -> String {
    with_loader(|loader| strip_directional_isolates(&loader.get(id)))
}

/// Retrieve a localised diagnostic with Fluent arguments supplied via a
/// closure.
///
/// # Examples
/// ```
/// # use kumo::localization;
/// let rendered = localization::message_with_args("panic-message-opaque-payload", |args| {
///     args.set("type", "Example".to_string());
/// });
/// assert!(rendered.contains("Example"));
/// ```
#[must_use]
pub fn message_with_args<F>(id: &str, configure: F) -> String
where
    F: FnOnce(&mut FluentArgs<'static>),
{
    with_loader(|loader| message_with_loader(loader, id, configure))
}

/// Render a message in the language of a document rather than the active
/// diagnostic language.
///
/// Language codes are matched against the bundled resources; unknown
/// languages fall back to English.
#[must_use]
pub fn message_in<F>(language: &str, id: &str, configure: F) -> String
where
    F: FnOnce(&mut FluentArgs<'static>),
{
    let loader = document_loader(language);
    message_with_loader(&loader, id, configure)
}

fn document_loader(language: &str) -> Arc<FluentLanguageLoader> {
    if let Some(loader) = DOCUMENT_LOADERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(language)
    {
        return Arc::clone(loader);
    }
    let requested: Vec<LanguageIdentifier> = language.parse().into_iter().collect();
    let loader = Arc::new(load(&requested).unwrap_or_else(|error| {
        log::warn!("falling back to English messages for '{language}': {error}");
        english()
    }));
    let mut guard = DOCUMENT_LOADERS
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(guard.entry(language.to_string()).or_insert(loader))
}

pub(crate) fn message_with_loader<F>(
    loader: &FluentLanguageLoader,
    id: &str,
    configure: F,
) -> String
where
    F: FnOnce(&mut FluentArgs<'static>),
{
    let mut args: FluentArgs<'static> = FluentArgs::new();
    configure(&mut args);
    strip_directional_isolates(&loader.get_args_fluent(id, Some(&args)))
}

pub(crate) fn with_loader<R>(callback: impl FnOnce(&FluentLanguageLoader) -> R) -> R {
    OVERRIDE_LOADER.with(|cell| {
        let borrow = cell.borrow();
        if let Some(loader) = borrow.as_ref() {
            return callback(loader);
        }
        drop(borrow);
        let guard = LANGUAGE_LOADER
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        callback(&guard)
    })
}

/// Remove Unicode directional isolates inserted by Fluent during interpolation.
#[must_use]
pub fn strip_directional_isolates(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{2066}' | '\u{2067}' | '\u{2068}' | '\u{2069}'))
        .collect()
}
