pub mod delivery;
pub mod events;
pub mod gateway;
pub mod registry;
pub mod ws;

pub use delivery::{Delivery, DeliveryRouter};
pub use events::{ClientEvent, OutgoingMessage, ServerEvent};
pub use gateway::{AuthenticatedConnection, BoundConnection, ConnectionState, Handshake, JoinPolicy, SessionGateway};
pub use registry::{outbox, ChannelRegistry, OUTBOX_CAPACITY};
