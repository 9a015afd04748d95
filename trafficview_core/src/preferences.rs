//! Per-session user preferences.

use serde::{Deserialize, Serialize};

/// Which metric the user wants routes optimized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    #[default]
    Fastest,
    Shortest,
    Eco,
}

impl std::str::FromStr for RouteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fastest" => Ok(RouteType::Fastest),
            "shortest" => Ok(RouteType::Shortest),
            "eco" => Ok(RouteType::Eco),
            _ => Err(format!("Unknown route type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub traffic_updates: bool,
    pub route_changes: bool,
    pub incident_alerts: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            traffic_updates: true,
            route_changes: true,
            incident_alerts: true,
        }
    }
}

/// Boolean preferences that can be flipped by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    AvoidTolls,
    AvoidHighways,
    ShowHeatmap,
    ShowIncidents,
    ShowTraffic,
    AutoRecalculate,
    TrafficUpdates,
    RouteChanges,
    IncidentAlerts,
}

impl std::str::FromStr for PreferenceKey {
    type Err = String;

    /// Accepts both `snake_case` and `camelCase` names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| *c != '_').collect::<String>().to_lowercase();
        match normalized.as_str() {
            "avoidtolls" => Ok(PreferenceKey::AvoidTolls),
            "avoidhighways" => Ok(PreferenceKey::AvoidHighways),
            "showheatmap" => Ok(PreferenceKey::ShowHeatmap),
            "showincidents" => Ok(PreferenceKey::ShowIncidents),
            "showtraffic" => Ok(PreferenceKey::ShowTraffic),
            "autorecalculate" => Ok(PreferenceKey::AutoRecalculate),
            "trafficupdates" => Ok(PreferenceKey::TrafficUpdates),
            "routechanges" => Ok(PreferenceKey::RouteChanges),
            "incidentalerts" => Ok(PreferenceKey::IncidentAlerts),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub preferred_route_type: RouteType,
    pub show_heatmap: bool,
    pub show_incidents: bool,
    pub show_traffic: bool,
    pub auto_recalculate: bool,
    pub notifications: NotificationPreferences,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            avoid_tolls: false,
            avoid_highways: false,
            preferred_route_type: RouteType::Fastest,
            show_heatmap: true,
            show_incidents: true,
            show_traffic: true,
            auto_recalculate: true,
            notifications: NotificationPreferences::default(),
        }
    }
}

impl UserPreferences {
    fn flag_mut(&mut self, key: PreferenceKey) -> &mut bool {
        match key {
            PreferenceKey::AvoidTolls => &mut self.avoid_tolls,
            PreferenceKey::AvoidHighways => &mut self.avoid_highways,
            PreferenceKey::ShowHeatmap => &mut self.show_heatmap,
            PreferenceKey::ShowIncidents => &mut self.show_incidents,
            PreferenceKey::ShowTraffic => &mut self.show_traffic,
            PreferenceKey::AutoRecalculate => &mut self.auto_recalculate,
            PreferenceKey::TrafficUpdates => &mut self.notifications.traffic_updates,
            PreferenceKey::RouteChanges => &mut self.notifications.route_changes,
            PreferenceKey::IncidentAlerts => &mut self.notifications.incident_alerts,
        }
    }

    /// Flips a flag and returns its new value.
    pub fn toggle(&mut self, key: PreferenceKey) -> bool {
        let flag = self.flag_mut(key);
        *flag = !*flag;
        *flag
    }

    /// Sets a flag explicitly.
    pub fn set(&mut self, key: PreferenceKey, value: bool) {
        *self.flag_mut(key) = value;
    }

    pub fn get(&self, key: PreferenceKey) -> bool {
        match key {
            PreferenceKey::AvoidTolls => self.avoid_tolls,
            PreferenceKey::AvoidHighways => self.avoid_highways,
            PreferenceKey::ShowHeatmap => self.show_heatmap,
            PreferenceKey::ShowIncidents => self.show_incidents,
            PreferenceKey::ShowTraffic => self.show_traffic,
            PreferenceKey::AutoRecalculate => self.auto_recalculate,
            PreferenceKey::TrafficUpdates => self.notifications.traffic_updates,
            PreferenceKey::RouteChanges => self.notifications.route_changes,
            PreferenceKey::IncidentAlerts => self.notifications.incident_alerts,
        }
    }

    /// Value snapshot of every preference.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn to_json(&self) -> String {
        self.snapshot().to_string()
    }
}
