use tokio::sync::mpsc;

use crate::{
    bridge::{InboundEvent, OutboundMessage, Transport},
    data_backend::{
        display_date, normalize_days, normalize_meal_detail, normalize_meals_for_list,
        openmensa_parser::MenuClient,
    },
    data_types::{
        openmensa_data_types::{Day, Meal},
        PricingTier, RequestTag, SessionState,
    },
    db_operations::ConfigStore,
    errors::{FetchError, MensaError},
    session_cache::SessionCache,
};

#[derive(Debug)]
pub enum SessionEvent {
    Inbound(InboundEvent),
    /// Raw response of the settings page.
    SettingsSaved(String),
    DaysLoaded {
        tag: RequestTag,
        result: Result<Vec<Day>, FetchError>,
    },
    MealsLoaded {
        tag: RequestTag,
        result: Result<Vec<Meal>, FetchError>,
    },
    Shutdown,
}

/// Owns everything one watch connection needs. Fetches run as spawned tasks
/// and report back through `events_tx`, so all state changes happen in
/// `handle`.
///
/// Day and meal fetches are tracked in separate slots: a date picked while
/// the day list is loading does not invalidate that day list.
pub struct Session<T> {
    config: ConfigStore,
    client: MenuClient,
    cache: SessionCache,
    transport: T,
    state: SessionState,
    pending_days: Option<RequestTag>,
    pending_meals: Option<RequestTag>,
    tier: PricingTier,
    events_tx: mpsc::Sender<SessionEvent>,
}

impl<T: Transport> Session<T> {
    pub fn new(
        config: ConfigStore,
        client: MenuClient,
        transport: T,
        events_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Session {
            config,
            client,
            cache: SessionCache::new(),
            transport,
            state: SessionState::Idle,
            pending_days: None,
            pending_meals: None,
            tier: PricingTier::default(),
            events_tx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Loads the day list, then handles events until `Shutdown` or until
    /// every sender is gone.
    pub async fn run(mut self, mut events_rx: mpsc::Receiver<SessionEvent>) {
        self.request_days().await;

        while let Some(event) = events_rx.recv().await {
            if matches!(event, SessionEvent::Shutdown) {
                log::info!("watch link closed, stopping session");
                break;
            }
            self.handle(event).await;
        }
    }

    pub async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Inbound(InboundEvent::ReloadDone) => self.request_days().await,
            SessionEvent::Inbound(InboundEvent::DateSelected(date)) => {
                self.request_meals(date).await
            }
            SessionEvent::Inbound(InboundEvent::MealSelected(id)) => self.show_meal(id).await,
            SessionEvent::SettingsSaved(response) => self.apply_settings(&response).await,
            SessionEvent::DaysLoaded { tag, result } => self.on_days_loaded(tag, result).await,
            SessionEvent::MealsLoaded { tag, result } => self.on_meals_loaded(tag, result).await,
            SessionEvent::Shutdown => {}
        }
    }

    async fn send(&mut self, message: OutboundMessage) -> bool {
        let kind = message.kind();
        match self.transport.send(&message.encode()).await {
            Ok(()) => {
                log::debug!("sent {}", kind);
                true
            }
            Err(e) => {
                log::error!("sending {} failed: {}", kind, e);
                false
            }
        }
    }

    async fn report(&mut self, err: MensaError) {
        match &err {
            MensaError::ConfigMissing => log::info!("{}", err),
            _ => log::error!("{}", err),
        }
        self.send(OutboundMessage::Error(err.user_message().to_string()))
            .await;
    }

    async fn canteen_id(&mut self) -> Option<String> {
        match self.config.canteen_id() {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                self.state = SessionState::Idle;
                self.report(MensaError::ConfigMissing).await;
                None
            }
            Err(e) => {
                self.state = SessionState::Idle;
                self.report(e.into()).await;
                None
            }
        }
    }

    pub async fn request_days(&mut self) {
        let Some(canteen_id) = self.canteen_id().await else {
            return;
        };

        let tag = RequestTag::days();
        self.pending_days = Some(tag);
        self.state = SessionState::FetchingDays(tag);
        log::info!("fetching days for canteen {}", canteen_id);

        let client = self.client.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_days(&canteen_id).await;
            if events_tx
                .send(SessionEvent::DaysLoaded { tag, result })
                .await
                .is_err()
            {
                log::debug!("session gone before days arrived");
            }
        });
    }

    pub async fn request_meals(&mut self, date: chrono::NaiveDate) {
        let Some(canteen_id) = self.canteen_id().await else {
            return;
        };

        let tag = RequestTag::meals(date);
        self.pending_meals = Some(tag);
        self.state = SessionState::FetchingMeals(tag);
        log::info!("fetching meals for {}", display_date(date));

        let client = self.client.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_meals(&canteen_id, date).await;
            if events_tx
                .send(SessionEvent::MealsLoaded { tag, result })
                .await
                .is_err()
            {
                log::debug!("session gone before meals arrived");
            }
        });
    }

    async fn on_days_loaded(&mut self, tag: RequestTag, result: Result<Vec<Day>, FetchError>) {
        if self.pending_days != Some(tag) {
            log::debug!("discarding stale day list {}", tag.id);
            return;
        }
        self.pending_days = None;

        let days = match result {
            Ok(days) => days,
            Err(e) => {
                self.state = self.settled_state(SessionState::Idle);
                self.report(e.into()).await;
                return;
            }
        };

        let normalized = normalize_days(&days);
        log::info!("{} of {} days open", normalized.len(), days.len());

        // a new day list invalidates whatever day the meals belonged to
        self.cache.clear();
        self.state = self.settled_state(SessionState::AwaitingSelection);

        let (day_list, weekday_list) = OutboundMessage::day_lists(&normalized);
        if self.send(day_list).await {
            self.send(weekday_list).await;
        } else {
            log::warn!("weekday list held back, day list was not acknowledged");
        }
    }

    async fn on_meals_loaded(&mut self, tag: RequestTag, result: Result<Vec<Meal>, FetchError>) {
        let Some(date) = tag.date else {
            log::debug!("discarding meals {} without a date", tag.id);
            return;
        };
        if self.pending_meals != Some(tag) {
            log::debug!("discarding stale meals for {}", display_date(date));
            return;
        }
        self.pending_meals = None;

        let meals = match result {
            Ok(meals) => meals,
            Err(e) => {
                self.state = self.settled_state(SessionState::AwaitingSelection);
                self.report(e.into()).await;
                return;
            }
        };

        self.tier = match self.config.pricing_tier() {
            Ok(tier) => tier,
            Err(e) => {
                log::warn!(
                    "reading pricing tier failed ({}), using {}",
                    e,
                    PricingTier::default()
                );
                PricingTier::default()
            }
        };

        let normalized = normalize_meals_for_list(&meals, self.tier);
        log::info!("{} meals on {}", meals.len(), display_date(date));

        self.cache.store(meals);
        self.state = self.settled_state(SessionState::Ready(date));
        self.send(OutboundMessage::meal_list(&normalized)).await;
    }

    /// State after a fetch completed: still fetching if the other slot is
    /// busy, `done` otherwise.
    fn settled_state(&self, done: SessionState) -> SessionState {
        match (self.pending_days, self.pending_meals) {
            (Some(tag), _) => SessionState::FetchingDays(tag),
            (None, Some(tag)) => SessionState::FetchingMeals(tag),
            (None, None) => done,
        }
    }

    async fn show_meal(&mut self, id: i64) {
        let Some(meal) = self.cache.lookup(id) else {
            log::debug!("meal {} not in cache, ignoring", id);
            return;
        };

        let detail = normalize_meal_detail(meal, self.tier);
        self.send(OutboundMessage::meal_detail(detail)).await;
    }

    async fn apply_settings(&mut self, response: &str) {
        match self.config.apply_settings_response(response) {
            Ok(written) if written.is_empty() => log::debug!("settings closed without changes"),
            Ok(written) => {
                log::info!("saved settings: {}", written.join(", "));
                self.config_changed().await;
            }
            Err(e) => log::error!("{}", e),
        }
    }

    async fn config_changed(&mut self) {
        log::info!("configuration changed, asking watch to reload");
        self.send(OutboundMessage::ReloadApp).await;
    }
}
