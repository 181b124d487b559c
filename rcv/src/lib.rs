// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


pub mod contest_metadata;
pub mod cast_vote_record;
pub mod config;
pub mod transfer_weight;
pub mod ranking_walk;
pub mod winning_threshold;
pub mod tie_resolution;
pub mod round_tally;
pub mod tabulation;
pub mod contest_result;
pub mod observer;
pub mod errors;
