//! Room listing for the authenticated user.

use std::io::Write;

use tracing::debug;

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::Room;

/// Rooms collection endpoint of the service API
pub const ROOMS_PATH: &str = "/v1/rooms";

pub struct RoomLister<'a> {
    api: &'a ApiClient,
}

impl<'a> RoomLister<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the rooms, in the order the service returns them
    pub async fn fetch(&self) -> Result<Vec<Room>> {
        let rooms: Vec<Room> = self.api.get_json(ROOMS_PATH).await?;
        debug!(count = rooms.len(), "Rooms fetched");
        Ok(rooms)
    }

    /// Fetch and render the numbered listing to `out`.
    ///
    /// Nothing is written unless the whole collection decoded.
    pub async fn list<W: Write>(&self, out: &mut W) -> Result<Vec<Room>> {
        let rooms = self.fetch().await?;
        render_rooms(&rooms, out)?;
        Ok(rooms)
    }
}

/// Write a 1-indexed `Nr. | Room Id` table
pub fn render_rooms<W: Write>(rooms: &[Room], out: &mut W) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Rooms:")?;
    writeln!(out, "Nr.  | Room Id")?;
    for (i, room) in rooms.iter().enumerate() {
        writeln!(out, "{}#   | {}", i + 1, room.id)?;
    }
    out.flush()
}
