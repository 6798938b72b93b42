//! Detail overlay state, mirrored into the `id` query parameter of the
//! client's current location.
//!
//! Every transition that opens or closes the overlay writes a new location
//! into [`History`], and moving through the history re-derives the overlay
//! from the location it lands on. The overlay only ever stores an id; the
//! prompt behind it is looked up in whatever catalog is current.

use url::Url;

use crate::catalog::Catalog;
use crate::error::LookupError;

pub const ID_PARAM: &str = "id";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    Closed,
    Open(String),
}

/// Copy of `location` with the `id` parameter set to `id`, or removed when
/// `id` is `None`. Other query parameters are kept in order.
pub fn with_id(location: &Url, id: Option<&str>) -> Url {
    let others: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(k, _)| k != ID_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = location.clone();
    url.set_query(None);
    if !others.is_empty() || id.is_some() {
        let mut query = url.query_pairs_mut();
        for (k, v) in &others {
            query.append_pair(k, v);
        }
        if let Some(id) = id {
            query.append_pair(ID_PARAM, id);
        }
    }
    url
}

/// The non-empty `id` parameter of `location`, if any.
pub fn id_of(location: &Url) -> Option<String> {
    location
        .query_pairs()
        .find(|(k, _)| k == ID_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Linear back/forward history of locations.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Url>,
    cursor: usize,
}

impl History {
    pub fn new(start: Url) -> Self {
        Self {
            entries: vec![start],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.cursor]
    }

    /// Add a location after the current one, dropping any forward entries.
    pub fn push(&mut self, url: Url) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(url);
        self.cursor = self.entries.len() - 1;
    }

    pub fn replace(&mut self, url: Url) {
        self.entries[self.cursor] = url;
    }

    pub fn back(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    overlay: Overlay,
    history: History,
    /// Id from the starting location that no loaded catalog has matched yet.
    pending: Option<String>,
}

impl Selection {
    pub fn new(start: Url) -> Self {
        let pending = id_of(&start);
        Self {
            overlay: Overlay::Closed,
            history: History::new(start),
            pending,
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn selected_id(&self) -> Option<&str> {
        match &self.overlay {
            Overlay::Open(id) => Some(id),
            Overlay::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.overlay, Overlay::Open(_))
    }

    pub fn location(&self) -> &Url {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Absolute link that opens `id` when loaded.
    pub fn link_for(&self, id: &str) -> Url {
        with_id(self.location(), Some(id))
    }

    pub fn open(&mut self, id: &str) {
        self.pending = None;
        if self.selected_id() == Some(id) {
            return;
        }
        self.overlay = Overlay::Open(id.to_string());
        let next = with_id(self.location(), Some(id));
        self.history.push(next);
    }

    pub fn close(&mut self) {
        self.pending = None;
        let had_id = id_of(self.location()).is_some();
        self.overlay = Overlay::Closed;
        if had_id {
            let next = with_id(self.location(), None);
            self.history.push(next);
        }
    }

    /// Step back in history and re-derive the overlay from the location.
    /// Returns `Ok(false)` when there is nothing to go back to.
    pub fn back(&mut self, catalog: &Catalog) -> Result<bool, LookupError> {
        if !self.history.back() {
            return Ok(false);
        }
        self.resolve_location(catalog).map(|()| true)
    }

    pub fn forward(&mut self, catalog: &Catalog) -> Result<bool, LookupError> {
        if !self.history.forward() {
            return Ok(false);
        }
        self.resolve_location(catalog).map(|()| true)
    }

    fn resolve_location(&mut self, catalog: &Catalog) -> Result<(), LookupError> {
        self.pending = None;
        match id_of(self.location()) {
            Some(id) if catalog.contains(&id) => {
                self.overlay = Overlay::Open(id);
                Ok(())
            }
            Some(id) => {
                self.overlay = Overlay::Closed;
                Err(LookupError { id })
            }
            None => {
                self.overlay = Overlay::Closed;
                Ok(())
            }
        }
    }

    /// Reconcile with a freshly loaded catalog.
    ///
    /// A starting-location id opens once a catalog holds it. An open overlay
    /// whose prompt has left the catalog closes, and the current location
    /// loses its id without adding a history entry.
    pub fn sync(&mut self, catalog: &Catalog) -> Result<(), LookupError> {
        if let Some(id) = self.pending.clone() {
            if catalog.contains(&id) {
                self.pending = None;
                self.overlay = Overlay::Open(id);
                return Ok(());
            }
            return Err(LookupError { id });
        }

        if let Overlay::Open(id) = &self.overlay {
            if !catalog.contains(id) {
                let id = id.clone();
                self.overlay = Overlay::Closed;
                let cleared = with_id(self.location(), None);
                self.history.replace(cleared);
                return Err(LookupError { id });
            }
        }
        Ok(())
    }
}
