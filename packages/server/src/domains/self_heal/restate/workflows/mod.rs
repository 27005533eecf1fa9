pub mod self_heal;
