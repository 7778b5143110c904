//! Cascading area → service selection
//!
//! Areas depend on (branch, client type) and services on (area, client type).
//! Each list remembers the tag of the one request it is waiting for; any
//! response carrying a different tag is stale and is discarded untouched.

use crate::api::ApiError;
use crate::error::KioskError;
use crate::kiosk::state::RequestTag;
use crate::models::{Area, Service};

/// Result of picking an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaPick {
    /// Same area as before; nothing to fetch.
    Unchanged,
    /// Not in the current area list.
    Unknown,
    /// New area selected; its services must be fetched.
    Fetch(Area),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    areas: Vec<Area>,
    services: Vec<Service>,
    selected_area: Option<Area>,
    selected_service: Option<Service>,
    areas_request: Option<RequestTag>,
    services_request: Option<(RequestTag, String)>,
}

impl SelectionEngine {
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn selected_area(&self) -> Option<&Area> {
        self.selected_area.as_ref()
    }

    pub fn selected_service(&self) -> Option<&Service> {
        self.selected_service.as_ref()
    }

    pub fn is_loading_areas(&self) -> bool {
        self.areas_request.is_some()
    }

    pub fn is_loading_services(&self) -> bool {
        self.services_request.is_some()
    }

    /// Forget everything, including outstanding requests.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start a fresh area listing. Anything selected under the old list goes.
    pub fn request_areas(&mut self, tag: RequestTag) {
        self.reset();
        self.areas_request = Some(tag);
    }

    pub fn apply_areas(
        &mut self,
        tag: RequestTag,
        result: Result<Vec<Area>, ApiError>,
    ) -> Result<usize, KioskError> {
        if self.areas_request != Some(tag) {
            return Err(KioskError::StaleResponse("areas"));
        }
        self.areas_request = None;
        match result {
            Ok(areas) => {
                self.areas = areas;
                Ok(self.areas.len())
            }
            Err(err) => {
                self.areas.clear();
                Err(KioskError::TransientLoad {
                    what: "areas",
                    detail: err.to_string(),
                })
            }
        }
    }

    /// Select an area. A new area clears the service list and service
    /// selection before its fetch is tracked under `tag`.
    pub fn select_area(&mut self, area_id: &str, tag: RequestTag) -> AreaPick {
        if self.selected_area.as_ref().is_some_and(|a| a.id == area_id) {
            return AreaPick::Unchanged;
        }
        let Some(area) = self.areas.iter().find(|a| a.id == area_id).cloned() else {
            return AreaPick::Unknown;
        };

        self.services.clear();
        self.selected_service = None;
        self.selected_area = Some(area.clone());
        self.services_request = Some((tag, area.id.clone()));
        AreaPick::Fetch(area)
    }

    pub fn apply_services(
        &mut self,
        tag: RequestTag,
        result: Result<Vec<Service>, ApiError>,
    ) -> Result<usize, KioskError> {
        let current_area = self.selected_area.as_ref().map(|a| a.id.as_str());
        match &self.services_request {
            Some((pending, area_id)) if *pending == tag && Some(area_id.as_str()) == current_area => {}
            _ => return Err(KioskError::StaleResponse("services")),
        }
        self.services_request = None;
        match result {
            Ok(services) => {
                self.services = services;
                Ok(self.services.len())
            }
            Err(err) => {
                self.services.clear();
                Err(KioskError::TransientLoad {
                    what: "services",
                    detail: err.to_string(),
                })
            }
        }
    }

    /// Select a service from the current list.
    pub fn select_service(&mut self, service_id: &str) -> Option<&Service> {
        let service = self.services.iter().find(|s| s.id == service_id)?.clone();
        self.selected_service = Some(service);
        self.selected_service.as_ref()
    }

    pub fn clear_service_selection(&mut self) {
        self.selected_service = None;
    }
}
