//! SeaORM entity models
//!
//! Member directory tables read by the recommendation engine

mod member;
mod member_block;

pub use member::{
    Entity as MemberEntity,
    Model as Member,
    ActiveModel as MemberActiveModel,
    Column as MemberColumn,
};

pub use member_block::{
    Entity as MemberBlockEntity,
    Model as MemberBlock,
    ActiveModel as MemberBlockActiveModel,
    Column as MemberBlockColumn,
};
