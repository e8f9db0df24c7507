//! Pagination state for postback-driven listings.

/// Hidden form state parsed from one page, plus the next postback target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Hidden fields to echo back, in document order.
    pub fields: Vec<(String, String)>,
    /// Postback target of the next page, if any.
    pub next_target: Option<String>,
}

/// Pager position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerState {
    /// Nothing requested yet.
    Initial,
    /// A next page is available.
    HasNext(PaginationState),
    /// No further pages.
    Done,
}

/// The request to issue for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page: POST without a body.
    Initial,
    /// Later page: POST with the hidden fields and the postback target.
    Postback(Vec<(String, String)>),
}

/// Drives `Initial -> HasNext -> ... -> Done` with a round cap.
#[derive(Debug, Clone)]
pub struct PaginationStateMachine {
    state: PagerState,
    rounds: u32,
    max_rounds: u32,
    hit_cap: bool,
    event_target_field: String,
    event_argument_field: String,
}

impl PaginationStateMachine {
    /// Create a machine in the `Initial` state.
    #[must_use]
    pub fn new(
        max_rounds: u32,
        event_target_field: impl Into<String>,
        event_argument_field: impl Into<String>,
    ) -> Self {
        Self {
            state: PagerState::Initial,
            rounds: 0,
            max_rounds: max_rounds.max(1),
            hit_cap: false,
            event_target_field: event_target_field.into(),
            event_argument_field: event_argument_field.into(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &PagerState {
        &self.state
    }

    /// Page requests issued so far.
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Whether pagination stopped at the round cap with pages remaining.
    #[must_use]
    pub fn hit_cap(&self) -> bool {
        self.hit_cap
    }

    /// The next request to issue, or `None` once pagination is over.
    ///
    /// Counts the request against the round cap.
    pub fn next_request(&mut self) -> Option<PageRequest> {
        let request = match &self.state {
            PagerState::Done => return None,
            PagerState::Initial => PageRequest::Initial,
            PagerState::HasNext(pagination) => {
                let target = pagination.next_target.clone().unwrap_or_default();
                PageRequest::Postback(self.postback_form(&pagination.fields, target))
            }
        };

        if self.rounds >= self.max_rounds {
            self.hit_cap = true;
            self.state = PagerState::Done;
            return None;
        }

        self.rounds += 1;
        Some(request)
    }

    /// Record the state parsed from the page just fetched.
    pub fn advance(&mut self, parsed: PaginationState) {
        self.state = if parsed.next_target.is_some() {
            PagerState::HasNext(parsed)
        } else {
            PagerState::Done
        };
    }

    /// Stop paginating.
    pub fn finish(&mut self) {
        self.state = PagerState::Done;
    }

    fn postback_form(&self, fields: &[(String, String)], target: String) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = fields
            .iter()
            .filter(|(name, _)| {
                *name != self.event_target_field && *name != self.event_argument_field
            })
            .cloned()
            .collect();
        form.push((self.event_target_field.clone(), target));
        form.push((self.event_argument_field.clone(), String::new()));
        form
    }
}
