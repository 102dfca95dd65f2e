//! Weather/location lookup coordination
//!
//! `LookupService` is the single owner of the per-coordinate result cache
//! and of the "current pending lookup" slot. A lookup first consults the
//! cache (entries expire after a configurable window), then runs the weather
//! fetch and the reverse geocode concurrently under one cancellation token.
//! Issuing a new lookup cancels the token of any still-pending one, so only
//! the most recently issued lookup can ever reach the cache or a caller
//! (last-issued-wins). A background sweeper evicts expired entries on a
//! fixed tick, independent of lookup traffic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::CacheConfig;
use crate::error::LookupError;
use crate::models::{Coordinate, LocationInfo, LookupResult, WeatherSnapshot};

/// Source of weather snapshots for a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_weather(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, LookupError>;
}

/// Source of reverse-geocoded address information for a coordinate
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<LocationInfo, LookupError>;
}

/// Cached lookup outcome, owned exclusively by the service's cache map
struct CacheEntry {
    data: LookupResult,
    timestamp: Instant,
}

/// Coordinates cached and in-flight lookups for the lifetime of the session
pub struct LookupService {
    weather: Arc<dyn WeatherProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    /// Token of the most recently issued, possibly still pending lookup
    current: Mutex<Option<CancellationToken>>,
    expiry_window: Duration,
    sweep_interval: Duration,
}

impl LookupService {
    /// Create a new service around the given providers
    #[must_use]
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            weather,
            geocoder,
            cache: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            expiry_window: config.expiry_window(),
            sweep_interval: config.sweep_interval(),
        }
    }

    /// Look up weather and location data for a coordinate.
    ///
    /// Returns a cached result when one exists for the rounded coordinate and
    /// is younger than the expiry window; a hit touches nothing else. A miss
    /// cancels any still-pending lookup, fetches weather and address
    /// concurrently, caches the combined result, and returns it.
    ///
    /// # Errors
    ///
    /// [`LookupError::Superseded`] when a newer lookup was issued while this
    /// one was in flight (swallow silently). [`LookupError::Failed`] when
    /// either fetch failed; the cache is left untouched in that case.
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn lookup(&self, coordinate: Coordinate) -> Result<LookupResult, LookupError> {
        let key = coordinate.cache_key();

        if let Some(data) = self.cached(&key) {
            debug!("Cache hit for {}", key);
            return Ok(data);
        }

        let token = CancellationToken::new();
        let previous = self.current.lock().unwrap().replace(token.clone());
        if let Some(previous) = previous {
            debug!("Superseding a pending lookup");
            previous.cancel();
        }

        // Both fetches run under the same token; dropping them on
        // cancellation aborts the underlying requests.
        let fetches = try_join(
            self.weather.fetch_weather(coordinate),
            self.geocoder.reverse_geocode(coordinate),
        );

        let result = tokio::select! {
            () = token.cancelled() => return Err(LookupError::Superseded),
            result = fetches => result,
        };

        let (weather, location) = match result {
            Ok(parts) => parts,
            // A failure observed after cancellation is still a silent outcome
            Err(_) if token.is_cancelled() => return Err(LookupError::Superseded),
            Err(err) => return Err(err),
        };

        // The fetches may have resolved in the same poll as a cancellation;
        // a superseded lookup must not write the cache or hand out a result.
        if token.is_cancelled() {
            return Err(LookupError::Superseded);
        }

        let data = LookupResult {
            weather,
            location,
            coordinate,
        };

        self.cache.lock().unwrap().insert(
            key,
            CacheEntry {
                data: data.clone(),
                timestamp: Instant::now(),
            },
        );

        Ok(data)
    }

    /// Fresh cache entry for a key, if any
    fn cached(&self, key: &str) -> Option<LookupResult> {
        let cache = self.cache.lock().unwrap();
        cache
            .get(key)
            .filter(|entry| entry.timestamp.elapsed() < self.expiry_window)
            .map(|entry| entry.data.clone())
    }

    /// Remove every cache entry older than the expiry window
    pub fn sweep(&self) {
        let mut cache = self.cache.lock().unwrap();
        let before = cache.len();
        cache.retain(|_, entry| entry.timestamp.elapsed() < self.expiry_window);
        let evicted = before - cache.len();
        if evicted > 0 {
            debug!("Swept {} expired cache entries", evicted);
        }
    }

    /// Number of entries currently cached, fresh or not
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    /// Start the background sweeper, which evicts expired entries on a fixed
    /// tick for as long as the service lives
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let period = self.sweep_interval;
        info!("Starting cache sweeper every {:?}", period);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tick.tick().await;
                service.sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::{CurrentConditions, HourlyForecast, WeatherSnapshot};

    fn snapshot(temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentConditions {
                temperature,
                apparent_temperature: temperature - 1.0,
                relative_humidity: 45.0,
                weather_code: 1,
                wind_speed: 8.0,
                uv_index: 5.0,
            },
            hourly: HourlyForecast::default(),
            timezone: "America/Sao_Paulo".to_string(),
            timezone_abbreviation: "BRT".to_string(),
        }
    }

    /// Weather stub with a per-call delay queue and a call counter
    struct FakeWeather {
        calls: AtomicUsize,
        delays: Mutex<VecDeque<Duration>>,
        fail: bool,
    }

    impl FakeWeather {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delays: Mutex::new(VecDeque::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delays: Mutex::new(VecDeque::new()),
                fail: true,
            })
        }

        fn push_delay(&self, delay: Duration) {
            self.delays.lock().unwrap().push_back(delay);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn fetch_weather(
            &self,
            coordinate: Coordinate,
        ) -> Result<WeatherSnapshot, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(LookupError::failed("weather fetch refused"));
            }
            Ok(snapshot(coordinate.latitude))
        }
    }

    struct FakeGeocoder;

    #[async_trait]
    impl ReverseGeocoder for FakeGeocoder {
        async fn reverse_geocode(
            &self,
            _coordinate: Coordinate,
        ) -> Result<LocationInfo, LookupError> {
            Ok(LocationInfo {
                city: Some("Brasília".to_string()),
                state: Some("Federal District".to_string()),
                country: Some("Brazil".to_string()),
            })
        }
    }

    fn service(weather: Arc<FakeWeather>) -> Arc<LookupService> {
        Arc::new(LookupService::new(
            weather,
            Arc::new(FakeGeocoder),
            &CacheConfig::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_lookup_within_window_is_served_from_cache() {
        let weather = FakeWeather::new();
        let service = service(Arc::clone(&weather));
        let coord = Coordinate::new(-15.7801, -47.9292);

        let first = service.lookup(coord).await.unwrap();
        let second = service.lookup(coord).await.unwrap();

        assert_eq!(weather.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nearby_coordinates_share_one_entry() {
        let weather = FakeWeather::new();
        let service = service(Arc::clone(&weather));

        service
            .lookup(Coordinate::new(-15.78005, -47.92919))
            .await
            .unwrap();
        service
            .lookup(Coordinate::new(-15.78006, -47.92918))
            .await
            .unwrap();

        assert_eq!(weather.calls(), 1);
        assert_eq!(service.cache_size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_a_fresh_fetch() {
        let weather = FakeWeather::new();
        let service = service(Arc::clone(&weather));
        let coord = Coordinate::new(-15.7801, -47.9292);

        service.lookup(coord).await.unwrap();
        tokio::time::advance(Duration::from_secs(10 * 60 + 1)).await;
        service.lookup(coord).await.unwrap();

        assert_eq!(weather.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_lookup_supersedes_a_pending_one() {
        let weather = FakeWeather::new();
        weather.push_delay(Duration::from_secs(5));
        let service = service(Arc::clone(&weather));

        let slow_coord = Coordinate::new(-15.7801, -47.9292);
        let fast_coord = Coordinate::new(-23.5505, -46.6333);

        let pending = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.lookup(slow_coord).await }
        });
        // Let the slow lookup install its token before issuing the next one
        tokio::time::sleep(Duration::from_millis(1)).await;

        let fast = service.lookup(fast_coord).await.unwrap();
        assert_eq!(fast.coordinate, fast_coord);

        let superseded = pending.await.unwrap();
        assert!(matches!(superseded, Err(LookupError::Superseded)));

        // Only the newer lookup's data may be cached
        assert_eq!(service.cache_size(), 1);
        assert!(service.cached(&fast_coord.cache_key()).is_some());
        assert!(service.cached(&slow_coord.cache_key()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_does_not_cancel_a_pending_lookup() {
        let weather = FakeWeather::new();
        let service = service(Arc::clone(&weather));
        let cached_coord = Coordinate::new(-15.7801, -47.9292);
        let pending_coord = Coordinate::new(-23.5505, -46.6333);

        service.lookup(cached_coord).await.unwrap();

        weather.push_delay(Duration::from_secs(5));
        let pending = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.lookup(pending_coord).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        // Served from cache; must not touch the pending lookup's token
        service.lookup(cached_coord).await.unwrap();

        let outcome = pending.await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(service.cache_size(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_leaves_the_cache_untouched() {
        let weather = FakeWeather::failing();
        let service = service(Arc::clone(&weather));
        let coord = Coordinate::new(-15.7801, -47.9292);

        let outcome = service.lookup(coord).await;
        assert!(matches!(outcome, Err(LookupError::Failed { .. })));
        assert_eq!(service.cache_size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_expired_entries() {
        let weather = FakeWeather::new();
        let service = service(Arc::clone(&weather));

        service
            .lookup(Coordinate::new(-15.7801, -47.9292))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        service
            .lookup(Coordinate::new(-23.5505, -46.6333))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2 * 60)).await;

        // First entry is now 11 minutes old, second only 2
        service.sweep();
        assert_eq!(service.cache_size(), 1);
        assert!(
            service
                .cached(&Coordinate::new(-23.5505, -46.6333).cache_key())
                .is_some()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_evicts_without_lookups() {
        let weather = FakeWeather::new();
        let service = service(Arc::clone(&weather));

        service
            .lookup(Coordinate::new(-15.7801, -47.9292))
            .await
            .unwrap();
        assert_eq!(service.cache_size(), 1);

        let sweeper = service.spawn_sweeper();
        // Sleeping past the expiry window lets the 60s ticks fire under
        // paused time with no lookup traffic at all
        tokio::time::sleep(Duration::from_secs(11 * 60)).await;

        assert_eq!(service.cache_size(), 0);
        sweeper.abort();
    }
}
